//! EXPRESS (ISO 10303-11) schema reader.
//!
//! Reads the subset of EXPRESS needed to reflect on IFC entity classes:
//! `TYPE` declarations (underlying types, enumerations, selects,
//! aggregations) and `ENTITY` declarations with their supertype and
//! explicit attributes. Derived and inverse attributes, rules and functions
//! are skipped.

use std::collections::HashMap;
use std::path::Path;

use nom::{
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    multi::separated_list1,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use tracing::debug;

use ifc2graph_core::error::{Ifc2GraphError, Ifc2GraphResult};
use ifc2graph_core::schema::{AttributeDeclaration, SchemaReflection, SelectAlternative, TypeShape};
use ifc2graph_core::source::MetaKind;

const PRIMITIVES: &[&str] = &["STRING", "BINARY", "REAL", "INTEGER", "NUMBER", "BOOLEAN", "LOGICAL"];
const AGGREGATES: &[&str] = &["LIST", "SET", "BAG", "ARRAY"];
const ENTITY_SECTIONS: &[&str] = &["DERIVE", "INVERSE", "UNIQUE", "WHERE"];

const OBJECT_DEFINITION: &str = "IfcObjectDefinition";
const RELATIONSHIP: &str = "IfcRelationship";

/// Type reference as written in the schema.
#[derive(Debug, Clone, PartialEq)]
enum TypeExpr {
    Primitive(String),
    Named(String),
    Aggregate(Box<TypeExpr>),
}

#[derive(Debug, Clone, PartialEq)]
enum TypeBody {
    Underlying(TypeExpr),
    Enumeration(Vec<String>),
    Select(Vec<String>),
}

#[derive(Debug, Clone)]
struct TypeDecl {
    name: String,
    body: TypeBody,
}

#[derive(Debug, Clone)]
struct EntityDecl {
    name: String,
    supertype: Option<String>,
    attributes: Vec<(String, TypeExpr)>,
}

enum Declaration {
    Type(TypeDecl),
    Entity(EntityDecl),
    Skipped,
}

/// An EXPRESS schema, queried by entity class name.
///
/// Lookups ignore case, since P21 files carry upper-case class names.
#[derive(Debug, Clone)]
pub struct ExpressSchema {
    name: String,
    types: HashMap<String, TypeDecl>,
    entities: HashMap<String, EntityDecl>,
}

impl ExpressSchema {
    pub fn load(path: &Path) -> Ifc2GraphResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Ifc2GraphError::open(format!("cannot read schema {}: {e}", path.display())))?;
        let schema = Self::parse(&text)?;
        debug!(path = %path.display(), schema = %schema.name, entities = schema.entities.len(), "Loaded EXPRESS schema");
        Ok(schema)
    }

    pub fn parse(text: &str) -> Ifc2GraphResult<Self> {
        let cleaned = strip_comments(text);
        let (mut rest, name) = schema_header(&cleaned).map_err(|e| nom_error(&cleaned, e))?;

        let mut schema = ExpressSchema {
            name: name.to_string(),
            types: HashMap::new(),
            entities: HashMap::new(),
        };

        loop {
            rest = rest.trim_start();
            if rest.is_empty() || rest.starts_with("END_SCHEMA") {
                break;
            }
            let (next, declaration) = declaration(rest).map_err(|e| nom_error(&cleaned, e))?;
            match declaration {
                Declaration::Type(t) => {
                    schema.types.insert(t.name.to_ascii_uppercase(), t);
                }
                Declaration::Entity(e) => {
                    schema.entities.insert(e.name.to_ascii_uppercase(), e);
                }
                Declaration::Skipped => {}
            }
            rest = next;
        }

        Ok(schema)
    }

    /// Declared spelling of an entity class name.
    pub fn canonical_entity(&self, class_name: &str) -> Option<&str> {
        self.entity(class_name).map(|e| e.name.as_str())
    }

    /// Declared spelling of a defined type name.
    pub fn canonical_type(&self, type_name: &str) -> Option<&str> {
        self.types
            .get(&type_name.to_ascii_uppercase())
            .map(|t| t.name.as_str())
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Whether `class_name` is `ancestor` or one of its subtypes.
    pub fn is_subtype_of(&self, class_name: &str, ancestor: &str) -> bool {
        self.lineage(class_name)
            .iter()
            .any(|e| e.name.eq_ignore_ascii_case(ancestor))
    }

    pub fn meta_kind(&self, class_name: &str) -> MetaKind {
        if self.is_subtype_of(class_name, OBJECT_DEFINITION) {
            MetaKind::ObjectDefinition
        } else if self.is_subtype_of(class_name, RELATIONSHIP) {
            MetaKind::Relationship
        } else {
            MetaKind::Other
        }
    }

    fn entity(&self, class_name: &str) -> Option<&EntityDecl> {
        self.entities.get(&class_name.to_ascii_uppercase())
    }

    /// The class followed by its supertypes, nearest first.
    fn lineage(&self, class_name: &str) -> Vec<&EntityDecl> {
        let mut chain = Vec::new();
        let mut current = self.entity(class_name);
        while let Some(e) = current {
            if chain.len() > self.entities.len() {
                break;
            }
            chain.push(e);
            current = e.supertype.as_deref().and_then(|s| self.entity(s));
        }
        chain
    }

    fn resolution_error(&self, name: &str) -> Ifc2GraphError {
        Ifc2GraphError::SchemaResolution {
            schema: self.name.clone(),
            class_name: name.to_string(),
        }
    }

    fn shape_of(&self, expr: &TypeExpr) -> Ifc2GraphResult<TypeShape> {
        match expr {
            TypeExpr::Primitive(p) => Ok(TypeShape::Simple(p.clone())),
            TypeExpr::Aggregate(inner) => Ok(TypeShape::Aggregation(Box::new(self.shape_of(inner)?))),
            TypeExpr::Named(name) => {
                if let Some(e) = self.entity(name) {
                    return Ok(TypeShape::Entity(e.name.clone()));
                }
                let decl = self
                    .types
                    .get(&name.to_ascii_uppercase())
                    .ok_or_else(|| self.resolution_error(name))?;
                Ok(match &decl.body {
                    TypeBody::Underlying(_) => TypeShape::ValueType(decl.name.clone()),
                    TypeBody::Enumeration(_) => TypeShape::Enumeration(decl.name.clone()),
                    TypeBody::Select(alternatives) => TypeShape::Select {
                        name: decl.name.clone(),
                        alternatives: alternatives
                            .iter()
                            .map(|a| self.alternative(a))
                            .collect::<Ifc2GraphResult<_>>()?,
                    },
                })
            }
        }
    }

    fn alternative(&self, name: &str) -> Ifc2GraphResult<SelectAlternative> {
        if let Some(e) = self.entity(name) {
            return Ok(SelectAlternative::Entity(e.name.clone()));
        }
        let decl = self
            .types
            .get(&name.to_ascii_uppercase())
            .ok_or_else(|| self.resolution_error(name))?;
        Ok(match decl.body {
            TypeBody::Underlying(_) => SelectAlternative::ValueType(decl.name.clone()),
            TypeBody::Enumeration(_) => SelectAlternative::Enumeration(decl.name.clone()),
            TypeBody::Select(_) => SelectAlternative::Select(decl.name.clone()),
        })
    }
}

impl SchemaReflection for ExpressSchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn declaration_for(&self, class_name: &str) -> Ifc2GraphResult<Vec<AttributeDeclaration>> {
        let lineage = self.lineage(class_name);
        if lineage.is_empty() {
            return Err(self.resolution_error(class_name));
        }

        let mut declarations = Vec::new();
        for entity in lineage.into_iter().rev() {
            for (name, expr) in &entity.attributes {
                declarations.push(AttributeDeclaration::new(name.clone(), self.shape_of(expr)?));
            }
        }
        Ok(declarations)
    }
}

fn nom_error(full: &str, err: nom::Err<Error<&str>>) -> Ifc2GraphError {
    let rest = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
        nom::Err::Incomplete(_) => "",
    };
    let offset = full.len() - rest.len();
    let line = full[..offset].matches('\n').count() + 1;
    let near: String = rest.chars().take(40).collect();
    Ifc2GraphError::open(format!("EXPRESS syntax error at line {line} near '{near}'"))
}

/// Blank out `(* ... *)` and `-- ...` comments, keeping line breaks.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            in_string = c != '\'';
            out.push(c);
            continue;
        }
        match (c, chars.peek()) {
            ('\'', _) => {
                in_string = true;
                out.push(c);
            }
            ('(', Some('*')) => {
                chars.next();
                let mut previous = ' ';
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        out.push('\n');
                    }
                    if previous == '*' && inner == ')' {
                        break;
                    }
                    previous = inner;
                }
                out.push(' ');
            }
            ('-', Some('-')) => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn name_list(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), identifier),
        ws(char(')')),
    )(input)
}

fn schema_header(input: &str) -> IResult<&str, &str> {
    let (input, _) = preceded(multispace0, terminated(tag("SCHEMA"), multispace1))(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = ws(char(';'))(input)?;
    Ok((input, name))
}

fn declaration(input: &str) -> IResult<&str, Declaration> {
    let (_, keyword) = identifier(input)?;
    match keyword {
        "TYPE" => {
            let (rest, t) = type_declaration(input)?;
            Ok((rest, Declaration::Type(t)))
        }
        "ENTITY" => {
            let (rest, e) = entity_declaration(input)?;
            Ok((rest, Declaration::Entity(e)))
        }
        _ => {
            let (rest, _) = skipped_block(input)?;
            Ok((rest, Declaration::Skipped))
        }
    }
}

/// FUNCTION, RULE and friends up to their END keyword; `USE`/`REFERENCE`
/// interface statements up to their semicolon.
fn skipped_block(input: &str) -> IResult<&str, ()> {
    let (rest, keyword) = identifier(input)?;
    let end = match keyword {
        "FUNCTION" => "END_FUNCTION",
        "RULE" => "END_RULE",
        "PROCEDURE" => "END_PROCEDURE",
        "CONSTANT" => "END_CONSTANT",
        "SUBTYPE_CONSTRAINT" => "END_SUBTYPE_CONSTRAINT",
        "USE" | "REFERENCE" => ";",
        _ => return Err(nom::Err::Error(Error::new(input, ErrorKind::Tag))),
    };
    let (rest, _) = take_until(end)(rest)?;
    let (rest, _) = tag(end)(rest)?;
    let (rest, _) = opt(ws(char(';')))(rest)?;
    Ok((rest, ()))
}

fn type_declaration(input: &str) -> IResult<&str, TypeDecl> {
    let (input, _) = terminated(tag("TYPE"), multispace1)(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = ws(char('='))(input)?;
    let (input, body) = type_body(input)?;
    let (input, _) = ws(char(';'))(input)?;
    let (input, _) = take_until("END_TYPE")(input)?;
    let (input, _) = terminated(tag("END_TYPE"), ws(char(';')))(input)?;
    Ok((
        input,
        TypeDecl {
            name: name.to_string(),
            body,
        },
    ))
}

fn type_body(input: &str) -> IResult<&str, TypeBody> {
    let (after, keyword) = identifier(input)?;
    match keyword {
        "ENUMERATION" => {
            let (rest, items) = preceded(ws(tag("OF")), name_list)(after)?;
            Ok((rest, TypeBody::Enumeration(to_strings(items))))
        }
        "SELECT" => {
            let (rest, items) = name_list(after)?;
            Ok((rest, TypeBody::Select(to_strings(items))))
        }
        _ => {
            let (rest, expr) = type_expr(input)?;
            Ok((rest, TypeBody::Underlying(expr)))
        }
    }
}

fn to_strings(items: Vec<&str>) -> Vec<String> {
    items.into_iter().map(str::to_string).collect()
}

fn type_expr(input: &str) -> IResult<&str, TypeExpr> {
    let (rest, name) = identifier(input)?;

    if AGGREGATES.contains(&name) {
        let (rest, _) = opt(preceded(
            multispace0,
            delimited(char('['), take_until("]"), char(']')),
        ))(rest)?;
        let (rest, _) = ws(tag("OF"))(rest)?;
        let (rest, _) = opt(terminated(tag("UNIQUE"), multispace1))(rest)?;
        let (rest, _) = opt(terminated(tag("OPTIONAL"), multispace1))(rest)?;
        let (rest, inner) = type_expr(rest)?;
        return Ok((rest, TypeExpr::Aggregate(Box::new(inner))));
    }

    if PRIMITIVES.contains(&name) {
        let (rest, _) = opt(preceded(
            multispace0,
            delimited(char('('), take_until(")"), char(')')),
        ))(rest)?;
        let (rest, _) = opt(preceded(multispace1, tag("FIXED")))(rest)?;
        return Ok((rest, TypeExpr::Primitive(name.to_string())));
    }

    Ok((rest, TypeExpr::Named(name.to_string())))
}

fn entity_declaration(input: &str) -> IResult<&str, EntityDecl> {
    let (input, _) = terminated(tag("ENTITY"), multispace1)(input)?;
    let (input, name) = identifier(input)?;
    let (input, head) = take_until(";")(input)?;
    let (input, _) = char(';')(input)?;
    let (input, body) = take_until("END_ENTITY")(input)?;
    let (input, _) = terminated(tag("END_ENTITY"), ws(char(';')))(input)?;

    let supertype = match head.find("SUBTYPE OF") {
        Some(pos) => {
            let (_, names) = name_list(&head[pos + "SUBTYPE OF".len()..])?;
            names.first().map(|s| s.to_string())
        }
        None => None,
    };

    let mut attributes = Vec::new();
    for statement in body.split(';') {
        let statement = statement.trim();
        if statement.is_empty() || statement.starts_with("SELF\\") {
            continue;
        }
        let first_word = statement.split_whitespace().next().unwrap_or_default();
        if ENTITY_SECTIONS.contains(&first_word) {
            break;
        }
        let (_, (names, expr)) = explicit_attribute(statement)?;
        attributes.extend(names.into_iter().map(|n| (n.to_string(), expr.clone())));
    }

    Ok((
        input,
        EntityDecl {
            name: name.to_string(),
            supertype,
            attributes,
        },
    ))
}

/// `A, B : OPTIONAL type`
fn explicit_attribute(input: &str) -> IResult<&str, (Vec<&str>, TypeExpr)> {
    let (input, names) = separated_list1(ws(char(',')), identifier)(input)?;
    let (input, _) = ws(char(':'))(input)?;
    let (input, _) = opt(terminated(tag("OPTIONAL"), multispace1))(input)?;
    let (input, expr) = type_expr(input)?;
    Ok((input, (names, expr)))
}
