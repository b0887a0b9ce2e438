use anyhow::Context;
use bytes::Bytes;
use uuid::Uuid;

use crate::state::AppState;

/// Presigned URLs handed back to clients stay valid for a week (the S3
/// presigning ceiling).
const IMAGE_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Upload a food image and return its publicly-resolvable URL. Runs
/// before any database write, so a failed upload never leaves a partial
/// Food behind.
pub async fn upload_food_image(
    st: &AppState,
    user_id: Uuid,
    food_id: Uuid,
    body: Bytes,
    content_type: &str,
) -> anyhow::Result<String> {
    anyhow::ensure!(!body.is_empty(), "empty image payload");

    let ext = ext_from_mime(content_type).unwrap_or("bin");
    let key = format!("foods/{}/{}.{}", user_id, food_id, ext);

    st.storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    st.storage
        .presign_get(&key, IMAGE_URL_TTL_SECS)
        .await
        .with_context(|| format!("presign url for {}", key))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod image_tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
        assert_eq!(ext_from_mime("whatever/else"), None);
    }

    #[tokio::test]
    async fn test_upload_returns_resolvable_url_with_key() {
        let state = AppState::fake();
        let user_id = uuid::Uuid::new_v4();
        let food_id = uuid::Uuid::new_v4();

        let url = upload_food_image(
            &state,
            user_id,
            food_id,
            bytes::Bytes::from_static(b"jpegdata"),
            "image/jpeg",
        )
        .await
        .unwrap();

        assert!(url.contains(&format!("foods/{}/{}.jpg", user_id, food_id)));
    }

    #[tokio::test]
    async fn test_empty_payload_is_rejected() {
        let state = AppState::fake();
        let err = upload_food_image(
            &state,
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4(),
            bytes::Bytes::new(),
            "image/png",
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("empty image payload"));
    }
}
