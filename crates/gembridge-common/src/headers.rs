use http::HeaderMap;

/// Ordered header list. Names compare case-insensitively.
pub type Headers = Vec<(String, String)>;

pub fn header_set(headers: &mut Headers, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    match headers
        .iter_mut()
        .find(|(k, _)| k.eq_ignore_ascii_case(&name))
    {
        Some((_, v)) => *v = value,
        None => headers.push((name, value)),
    }
}

pub fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub fn header_remove(headers: &mut Headers, name: &str) -> Option<String> {
    let idx = headers
        .iter()
        .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
    Some(headers.remove(idx).1)
}

/// Non-UTF-8 values are dropped.
pub fn headers_from_map(map: &HeaderMap) -> Headers {
    map.iter()
        .filter_map(|(k, v)| {
            v.to_str()
                .ok()
                .map(|v| (k.as_str().to_string(), v.to_string()))
        })
        .collect()
}
