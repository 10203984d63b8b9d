//! Attribute-name exception tables.
//!
//! These names are schema quirks collected from IFC2X3 and IFC4 models. The
//! classifier consults them as data; add names here, not in the algorithm.

/// Attributes that hold scalars although their declared type is an inline
/// primitive, an entity-like select or an aggregation.
pub const SCALAR_EXCEPTIONS: &[&str] = &[
    // IfcDimensionalExponents
    "LengthExponent",
    "MassExponent",
    "TimeExponent",
    "ElectricCurrentExponent",
    "ThermodynamicTemperatureExponent",
    "AmountOfSubstanceExponent",
    "LuminousIntensityExponent",
    // IfcDerivedUnitElement
    "Exponent",
    // IfcGeometricRepresentationContext
    "Precision",
    // IfcCartesianTransformationOperator (IFC2X3)
    "Scale",
    "Scale2",
    "Scale3",
    // IfcFaceOuterBound (IFC2X3)
    "Orientation",
    // IfcCompositeCurve (IFC2X3)
    "SelfIntersect",
    // IfcCompositeCurveSegment (IFC2X3)
    "SameSense",
    // IfcTrimmedCurve (IFC2X3)
    "SenseAgreement",
    // IfcPolygonalBoundedHalfSpace
    "AgreementFlag",
    "ParameterTakesPrecedence",
    "ClosedCurve",
    "LayerOn",
    "LayerFrozen",
    "LayerBlocked",
    "ProductDefinitional",
    "RelatedPriorities",
    "RelatingPriorities",
    "USense",
    "VSense",
    "WeightsData",
    "Weights",
    "Sizeable",
    "IsCritical",
    "DestabilizingLoad",
    "IsLinear",
    "RepeatS",
    "RepeatT",
    "IsHeading",
    "IsMilestone",
    "Priority",
    "IsPotable",
    "NumberOfRiser",
    "NumberOfTreads",
    "Pixel",
    "InputPhase",
    "Degree",
    "CurveFont",
    "DiffuseColour",
    "TransmissionColour",
    "DiffuseTransmissionColour",
    "ReflectionColour",
    "SpecularColour",
    "ColourList",
    "ColourIndex",
    "NominalValue",
    "AddressLines",
    "StartOfNextHatchLine",
];

/// Aggregations that are scalar tuples (coordinates, name parts, trim
/// parameters) rather than collections of entities.
pub const TUPLE_EXCEPTIONS: &[&str] = &[
    "Coordinates",
    "DirectionRatios",
    "CoordList",
    "segments",
    "MiddleNames",
    "PrefixTitles",
    "SuffixTitles",
    "Roles",
    "Addresses",
    "CoordIndex",
    "InnerCoordIndices",
    "Trim1",
    "Trim2",
    "Orientation",
    "RefLongitude",
    "RefLatitude",
    "NominalValue",
];

pub fn is_scalar_exception(attribute: &str) -> bool {
    SCALAR_EXCEPTIONS.contains(&attribute)
}

pub fn is_tuple_exception(attribute: &str) -> bool {
    TUPLE_EXCEPTIONS.contains(&attribute)
}
