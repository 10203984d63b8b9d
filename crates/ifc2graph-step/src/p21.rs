//! P21 (ISO 10303-21) clear-text reader.
//!
//! Parses the header and data sections into raw instance records. Names
//! and references are left unresolved; [`crate::IfcDocument`] resolves them
//! against a schema.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize, value},
    multi::{many0, many1, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use ifc2graph_core::error::{Ifc2GraphError, Ifc2GraphResult};

/// A parameter value before reference resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// `$`
    Null,
    /// `*`, a slot redeclared as derived.
    Derived,
    Integer(i64),
    Real(f64),
    String(String),
    /// `.NAME.`, including the logical literals.
    Enumeration(String),
    Binary(String),
    Reference(u64),
    List(Vec<RawValue>),
    /// `TYPENAME(value)`
    Typed(String, Box<RawValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Simple {
        class_name: String,
        parameters: Vec<RawValue>,
    },
    /// `#id = (A(...) B(...));`
    Complex(Vec<(String, Vec<RawValue>)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawInstance {
    pub id: u64,
    pub record: RawRecord,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub description: Vec<String>,
    pub name: String,
    pub time_stamp: String,
    pub schema_identifiers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct P21File {
    pub header: Header,
    pub instances: Vec<RawInstance>,
}

/// Parse a whole P21 exchange structure.
pub fn parse(text: &str) -> Ifc2GraphResult<P21File> {
    let cleaned = strip_comments(text);
    match exchange_file(&cleaned) {
        Ok((rest, file)) if rest.trim().is_empty() => Ok(file),
        Ok((rest, _)) => Err(syntax_error(&cleaned, rest)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(syntax_error(&cleaned, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(Ifc2GraphError::open("unexpected end of P21 input")),
    }
}

/// Parse only the header section.
pub fn parse_header(text: &str) -> Ifc2GraphResult<Header> {
    let cleaned = strip_comments(text);
    let parsed = preceded(
        terminated(ws(tag("ISO-10303-21")), ws(char(';'))),
        header_section,
    )(cleaned.as_str());
    match parsed {
        Ok((_, header)) => Ok(header),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(syntax_error(&cleaned, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(Ifc2GraphError::open("unexpected end of P21 header")),
    }
}

fn syntax_error(full: &str, rest: &str) -> Ifc2GraphError {
    let offset = full.len() - rest.len();
    let line = full[..offset].matches('\n').count() + 1;
    let near: String = rest.trim_start().chars().take(40).collect();
    Ifc2GraphError::open(format!("P21 syntax error at line {line} near '{near}'"))
}

/// Replace `/* ... */` comments outside string literals with blanks,
/// keeping line breaks.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            if c == '\'' {
                in_string = false;
            }
            out.push(c);
            continue;
        }
        match c {
            '\'' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = ' ';
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        out.push('\n');
                    }
                    if previous == '*' && inner == '/' {
                        break;
                    }
                    previous = inner;
                }
                out.push(' ');
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

fn exchange_file(input: &str) -> IResult<&str, P21File> {
    let (input, _) = terminated(ws(tag("ISO-10303-21")), ws(char(';')))(input)?;
    let (input, header) = header_section(input)?;
    let (input, instances) = data_section(input)?;
    let (input, _) = terminated(ws(tag("END-ISO-10303-21")), ws(char(';')))(input)?;
    Ok((input, P21File { header, instances }))
}

fn header_section(input: &str) -> IResult<&str, Header> {
    let (input, _) = terminated(ws(tag("HEADER")), ws(char(';')))(input)?;
    let (input, records) = many0(terminated(ws(simple_record), ws(char(';'))))(input)?;
    let (input, _) = terminated(ws(tag("ENDSEC")), ws(char(';')))(input)?;

    let mut header = Header::default();
    for (name, parameters) in records {
        match name.as_str() {
            "FILE_DESCRIPTION" => header.description = string_list(parameters.first()),
            "FILE_NAME" => {
                header.name = string_at(&parameters, 0);
                header.time_stamp = string_at(&parameters, 1);
            }
            "FILE_SCHEMA" => header.schema_identifiers = string_list(parameters.first()),
            _ => {}
        }
    }
    Ok((input, header))
}

fn string_at(parameters: &[RawValue], index: usize) -> String {
    match parameters.get(index) {
        Some(RawValue::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn string_list(value: Option<&RawValue>) -> Vec<String> {
    match value {
        Some(RawValue::List(items)) => items
            .iter()
            .filter_map(|v| match v {
                RawValue::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn data_section(input: &str) -> IResult<&str, Vec<RawInstance>> {
    let (input, _) = ws(tag("DATA"))(input)?;
    let (input, _) = opt(parameter_list)(input)?;
    let (input, _) = ws(char(';'))(input)?;
    let (input, instances) = many0(terminated(ws(instance), ws(char(';'))))(input)?;
    let (input, _) = terminated(ws(tag("ENDSEC")), ws(char(';')))(input)?;
    Ok((input, instances))
}

fn instance(input: &str) -> IResult<&str, RawInstance> {
    let (input, id) = reference(input)?;
    let (input, _) = ws(char('='))(input)?;
    let (input, record) = alt((
        map(simple_record, |(class_name, parameters)| RawRecord::Simple {
            class_name,
            parameters,
        }),
        map(
            delimited(char('('), many1(ws(simple_record)), char(')')),
            RawRecord::Complex,
        ),
    ))(input)?;
    Ok((input, RawInstance { id, record }))
}

fn simple_record(input: &str) -> IResult<&str, (String, Vec<RawValue>)> {
    let (input, name) = keyword(input)?;
    let (input, parameters) = preceded(multispace0, parameter_list)(input)?;
    Ok((input, (name.to_string(), parameters)))
}

fn keyword(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn parameter_list(input: &str) -> IResult<&str, Vec<RawValue>> {
    delimited(
        char('('),
        separated_list0(preceded(multispace0, char(',')), parameter),
        preceded(multispace0, char(')')),
    )(input)
}

fn parameter(input: &str) -> IResult<&str, RawValue> {
    preceded(
        multispace0,
        alt((
            value(RawValue::Null, char('$')),
            value(RawValue::Derived, char('*')),
            map(reference, RawValue::Reference),
            map(string_literal, RawValue::String),
            map(binary, RawValue::Binary),
            map(enumeration, RawValue::Enumeration),
            map(parameter_list, RawValue::List),
            typed,
            map(real, RawValue::Real),
            map(integer, RawValue::Integer),
        )),
    )(input)
}

fn reference(input: &str) -> IResult<&str, u64> {
    preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u64>()))(input)
}

fn typed(input: &str) -> IResult<&str, RawValue> {
    let (input, name) = keyword(input)?;
    let (input, inner) = preceded(
        multispace0,
        delimited(char('('), parameter, preceded(multispace0, char(')'))),
    )(input)?;
    Ok((input, RawValue::Typed(name.to_string(), Box::new(inner))))
}

fn enumeration(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            char('.'),
        ),
        str::to_string,
    )(input)
}

fn binary(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_while(|c: char| c.is_ascii_hexdigit()), char('"')),
        str::to_string,
    )(input)
}

fn real(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            char('.'),
            digit0,
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

fn integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |s: &str| s.parse::<i64>())(input)
}

/// A quoted string; `''` stands for one quote.
fn string_literal(input: &str) -> IResult<&str, String> {
    let (mut rest, _) = char('\'')(input)?;
    let mut raw = String::new();
    loop {
        let (after, chunk) = take_while(|c: char| c != '\'')(rest)?;
        raw.push_str(chunk);
        let (after, _) = char('\'')(after)?;
        match after.strip_prefix('\'') {
            Some(escaped) => {
                raw.push('\'');
                rest = escaped;
            }
            None => return Ok((after, decode_string(&raw))),
        }
    }
}

/// Decode the control directives of a P21 string.
pub fn decode_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(r) = rest.strip_prefix("\\\\") {
            out.push('\\');
            rest = r;
        } else if let Some(r) = rest.strip_prefix("\\X2\\") {
            let end = r.find("\\X0\\").unwrap_or(r.len());
            let units: Vec<u16> = hex_units(&r[..end], 4).map(|u| u as u16).collect();
            out.extend(char::decode_utf16(units).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)));
            rest = r.get(end + 4..).unwrap_or("");
        } else if let Some(r) = rest.strip_prefix("\\X4\\") {
            let end = r.find("\\X0\\").unwrap_or(r.len());
            out.extend(hex_units(&r[..end], 8).map(|u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER)));
            rest = r.get(end + 4..).unwrap_or("");
        } else if let Some(r) = rest.strip_prefix("\\X\\") {
            match r.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                Some(byte) => {
                    out.push(char::from(byte));
                    rest = &r[2..];
                }
                None => {
                    out.push_str("\\X\\");
                    rest = r;
                }
            }
        } else if let Some(r) = rest.strip_prefix("\\S\\") {
            match r.chars().next() {
                Some(c) => {
                    out.push(char::from_u32(c as u32 + 128).unwrap_or(c));
                    rest = &r[c.len_utf8()..];
                }
                None => rest = r,
            }
        } else if rest.len() >= 4 && rest.starts_with("\\P") && rest.as_bytes()[3] == b'\\' {
            // code page switch
            rest = &rest[4..];
        } else {
            out.push('\\');
            rest = &rest[1..];
        }
    }

    out.push_str(rest);
    out
}

fn hex_units(hex: &str, width: usize) -> impl Iterator<Item = u32> + '_ {
    hex.as_bytes()
        .chunks(width)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|s| u32::from_str_radix(s, 16).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('wall.ifc','2022-05-04T08:08:30',('Author'),(''),'IfcOpenShell','IfcOpenShell','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
/* owner */
#1=IFCOWNERHISTORY($,$,$,.ADDED.,$,$,$,1651651710);
#17= IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',#1,'West Wall',$,*,(#20,#21),.T.,-1.5E-3,IFCLABEL('it''s'));
ENDSEC;
END-ISO-10303-21;
";

    #[test]
    fn test_parse_header() {
        let file = parse(SAMPLE).unwrap();
        assert_eq!(file.header.time_stamp, "2022-05-04T08:08:30");
        assert_eq!(file.header.schema_identifiers, vec!["IFC4"]);
        assert_eq!(file.header.name, "wall.ifc");
        assert_eq!(parse_header(SAMPLE).unwrap(), file.header);
    }

    #[test]
    fn test_parse_instances() {
        let file = parse(SAMPLE).unwrap();
        assert_eq!(file.instances.len(), 2);

        let RawRecord::Simple { class_name, parameters } = &file.instances[1].record else {
            panic!("expected a simple record");
        };
        assert_eq!(file.instances[1].id, 17);
        assert_eq!(class_name, "IFCWALL");
        assert_eq!(
            parameters,
            &vec![
                RawValue::String("2O2Fr$t4X7Zf8NOew3FLOH".into()),
                RawValue::Reference(1),
                RawValue::String("West Wall".into()),
                RawValue::Null,
                RawValue::Derived,
                RawValue::List(vec![RawValue::Reference(20), RawValue::Reference(21)]),
                RawValue::Enumeration("T".into()),
                RawValue::Real(-1.5e-3),
                RawValue::Typed("IFCLABEL".into(), Box::new(RawValue::String("it's".into()))),
            ]
        );
    }

    #[test]
    fn test_complex_record() {
        let text = SAMPLE.replace(
            "/* owner */",
            "#5=(IFCLENGTHMEASURE() IFCNAMEDUNIT(*,.LENGTHUNIT.));",
        );
        let file = parse(&text).unwrap();
        assert!(matches!(file.instances[0].record, RawRecord::Complex(ref parts) if parts.len() == 2));
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let broken = SAMPLE.replace("#17= IFCWALL(", "#17= IFCWALL((");
        let err = parse(&broken).unwrap_err().to_string();
        assert!(err.contains("line 10"), "{err}");
    }

    #[test]
    fn test_decode_string() {
        assert_eq!(decode_string("Stra\\X2\\00DF\\X0\\e"), "Straße");
        assert_eq!(decode_string("\\X\\E9t\\X\\E9"), "été");
        assert_eq!(decode_string("a\\\\b"), "a\\b");
        assert_eq!(decode_string("\\X4\\0001F600\\X0\\"), "\u{1F600}");
        assert_eq!(decode_string("plain"), "plain");
    }

    #[test]
    fn test_comments_inside_strings_are_kept() {
        assert_eq!(strip_comments("'/* no */' /* yes */x"), "'/* no */'  x");
    }
}
