use crate::value::Value;

/// Walk `data` along a dotted path.
///
/// Objects descend by key, arrays by in-bounds decimal index, host objects
/// through their readable fields. `None` means some segment could not be
/// followed; a path that resolves to an explicit `null` yields `Some(Null)`.
/// The empty path resolves to `data` itself.
pub fn get_path(data: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return Some(data.clone());
    }
    let mut segments = path.split('.');
    let mut current = data;
    while let Some(segment) = segments.next() {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            Value::Array(items) => current = items.get(parse_index(segment)?)?,
            Value::Host(host) => {
                let field = host.field(segment)?;
                let rest = segments.collect::<Vec<_>>().join(".");
                if rest.is_empty() {
                    return Some(field);
                }
                return get_path(&field, &rest);
            }
            _ => return None,
        }
    }
    Some(current.clone())
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // "01" is a property name, not an index.
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    segment.parse::<usize>().ok()
}
