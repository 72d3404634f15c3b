use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use crate::error::EncodingError;
use crate::request::SourceImage;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Transport-safe form of the source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Base64 payload, never carrying a `data:` prefix
    pub data: String,
    pub mime_type: String,
}

/// Decoded image bytes with a resolved mime type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Load the bytes behind a source, whatever form it came in.
pub async fn read_source(source: &SourceImage) -> Result<RawImage, EncodingError> {
    let (data, mime_type) = match source {
        SourceImage::Bytes { data, mime_type } => (data.clone(), mime_type.clone()),
        SourceImage::File { path, mime_type } => {
            let data = tokio::fs::read(path).await.map_err(|e| EncodingError::Read {
                path: path.display().to_string(),
                source: e,
            })?;
            (data, mime_type.clone())
        }
        SourceImage::DataUri(uri) => decode_data_uri(uri)?,
    };

    if data.is_empty() {
        return Err(EncodingError::Empty);
    }

    let mime_type = match mime_type {
        Some(mime) if !mime.trim().is_empty() => mime.trim().to_string(),
        _ => sniff_mime_type(&data),
    };

    Ok(RawImage { data, mime_type })
}

/// Turn the user's image into a base64 payload for submission.
pub async fn encode(source: &SourceImage) -> Result<EncodedImage, EncodingError> {
    let raw = read_source(source).await?;
    Ok(EncodedImage {
        data: BASE64.encode(&raw.data),
        mime_type: raw.mime_type,
    })
}

/// Split `data:<mime>;base64,<payload>` and decode the payload.
fn decode_data_uri(uri: &str) -> Result<(Vec<u8>, Option<String>), EncodingError> {
    let Some((header, payload)) = uri.split_once(',') else {
        return Err(EncodingError::MalformedDataUri("missing ',' separator".into()));
    };

    let Some(meta) = header.strip_prefix("data:") else {
        return Err(EncodingError::MalformedDataUri("missing 'data:' scheme".into()));
    };

    let Some(mime) = meta.strip_suffix(";base64") else {
        return Err(EncodingError::MalformedDataUri("payload is not base64".into()));
    };

    let data = BASE64
        .decode(payload.trim())
        .map_err(|e| EncodingError::MalformedDataUri(e.to_string()))?;

    let mime = (!mime.is_empty()).then(|| mime.to_string());
    Ok((data, mime))
}

pub fn sniff_mime_type(data: &[u8]) -> String {
    image::guess_format(data)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_MIME.to_string())
}
