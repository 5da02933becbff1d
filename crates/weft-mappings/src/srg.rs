use crate::table::MappingTable;
use crate::MappingError;

/// Parses an SRG mapping file.
///
/// Recognized records:
///
/// ```text
/// PK: a com/example
/// CL: a com/example/Foo
/// FD: a/b com/example/Foo/count
/// MD: a/c (La;)V com/example/Foo/accept (Lcom/example/Foo;)V
/// ```
///
/// The left side is always the compiled name. Blank lines and `#` comments
/// are skipped; package records carry no member information and are ignored.
pub fn parse_srg(version: &str, text: &str) -> Result<MappingTable, MappingError> {
    let mut table = MappingTable::new(version);

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        let (tag, rest) = line
            .split_once(':')
            .ok_or_else(|| malformed(line_no, format!("missing record tag in `{line}`")))?;
        let parts: Vec<&str> = rest.split_whitespace().collect();

        match tag.trim() {
            "PK" => expect_parts(line_no, "PK", &parts, 2)?,
            "CL" => {
                expect_parts(line_no, "CL", &parts, 2)?;
                table.add_class(parts[0], parts[1]);
            }
            "FD" => {
                expect_parts(line_no, "FD", &parts, 2)?;
                let compiled = split_member(line_no, parts[0])?;
                let mapped = split_member(line_no, parts[1])?;
                table.add_field(compiled, mapped);
            }
            "MD" => {
                expect_parts(line_no, "MD", &parts, 4)?;
                let (owner, name) = split_member(line_no, parts[0])?;
                let (mapped_owner, mapped_name) = split_member(line_no, parts[2])?;
                if !parts[1].starts_with('(') || !parts[3].starts_with('(') {
                    return Err(malformed(line_no, "method record without a method descriptor"));
                }
                table.add_method(
                    (owner, name, parts[1]),
                    (mapped_owner, mapped_name, parts[3]),
                );
            }
            other => {
                return Err(malformed(line_no, format!("unknown record tag `{other}`")));
            }
        }
    }

    Ok(table)
}

fn expect_parts(line: usize, tag: &str, parts: &[&str], expected: usize) -> Result<(), MappingError> {
    if parts.len() == expected {
        Ok(())
    } else {
        Err(malformed(
            line,
            format!("{tag} record expects {expected} fields, found {}", parts.len()),
        ))
    }
}

fn split_member(line: usize, qualified: &str) -> Result<(&str, &str), MappingError> {
    match qualified.rsplit_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok((owner, name)),
        _ => Err(malformed(line, format!("`{qualified}` is not an owner-qualified member"))),
    }
}

fn malformed(line: usize, message: impl Into<String>) -> MappingError {
    MappingError::Malformed {
        line,
        message: message.into(),
    }
}
