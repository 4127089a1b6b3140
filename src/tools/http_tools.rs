use mime_guess::get_mime_extensions_str;
use nanoid::nanoid;

pub fn extract_header(headers: &http::HeaderMap, name: http::HeaderName) -> Option<&str>{
    headers.get(name).and_then(|l| l.to_str().ok())
}

pub fn get_extension_from_mime(mime: &str) -> String {
    let suffix = get_mime_extensions_str(mime).and_then(|f| f.first()).unwrap_or(&"bin").to_string();

    match suffix.as_str() {
        "jpe" => "jpeg",
        _ => &suffix
    }.to_string()
}

/// Best-effort filename for an upload: last URL path segment when it already
/// carries an extension, otherwise derived from the mime type.
pub fn guess_filename(url: &str, mime: &Option<String>) -> String {
    let last_path = url.split("/").last().and_then(|p| p.split("?").next());
    if let Some(last_path) = last_path {
        if last_path.split(".").last().and_then(|e| if e.len() < 6 {Some(e)} else {None}).is_some() {
            last_path.to_string()
        } else if let Some(mime) = &mime {
            let ext = get_extension_from_mime(mime);
            format!("{}.{}", last_path, ext)
        } else {
            nanoid!()
        }
    } else if let Some(mime) = &mime {
        let ext = get_extension_from_mime(mime);
        format!("{}.{}", nanoid!(), ext)
    } else {
        nanoid!()
    }
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_from_url() {
        assert_eq!(guess_filename("https://example.com/photos/portrait.jpg?w=200", &None), "portrait.jpg".to_string());
    }

    #[test]
    fn filename_from_mime() {
        assert_eq!(guess_filename("https://example.com/photos/portrait", &Some("image/png".to_string())), "portrait.png".to_string());
    }
}
