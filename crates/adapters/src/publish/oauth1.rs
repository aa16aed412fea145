//! OAuth 1.0a request signing (HMAC-SHA1) for the X v2 write API

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use time::OffsetDateTime;

/// RFC 3986 unreserved characters stay literal, everything else is encoded
const ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// OAuth 1.0a user-context credentials
#[derive(Clone)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: SecretString,
    pub access_token: String,
    pub access_token_secret: SecretString,
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, ENCODE_SET).to_string()
}

fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Build the `Authorization: OAuth ...` header value for a request
///
/// `extra_params` must contain every query/form parameter included in the
/// request; JSON bodies contribute nothing to the signature base.
pub fn authorization_header(
    credentials: &OAuth1Credentials,
    method: &str,
    url: &str,
    extra_params: &[(String, String)],
) -> String {
    let nonce = generate_nonce();
    let timestamp = OffsetDateTime::now_utc().unix_timestamp().to_string();
    authorization_header_with(credentials, method, url, extra_params, &nonce, &timestamp)
}

/// Deterministic variant with injected nonce and timestamp
pub fn authorization_header_with(
    credentials: &OAuth1Credentials,
    method: &str,
    url: &str,
    extra_params: &[(String, String)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let oauth_params = vec![
        ("oauth_consumer_key".to_string(), credentials.consumer_key.clone()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), credentials.access_token.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];

    // Parameter string: all params percent-encoded, sorted by encoded key
    // then encoded value
    let mut all_params: Vec<(String, String)> = oauth_params
        .iter()
        .chain(extra_params.iter())
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    all_params.sort();

    let param_string = all_params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&param_string)
    );

    let signing_key = format!(
        "{}&{}",
        encode(credentials.consumer_secret.expose_secret()),
        encode(credentials.access_token_secret.expose_secret())
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(signing_key.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(base_string.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    let mut header_params = oauth_params;
    header_params.push(("oauth_signature".to_string(), signature));
    header_params.sort();

    let rendered = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> OAuth1Credentials {
        OAuth1Credentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            consumer_secret: SecretString::new("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".into()),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            access_token_secret: SecretString::new(
                "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".into(),
            ),
        }
    }

    #[test]
    fn test_encode_leaves_unreserved_untouched() {
        assert_eq!(encode("abc-XYZ_0.9~"), "abc-XYZ_0.9~");
        assert_eq!(encode("a b&c=d"), "a%20b%26c%3Dd");
    }

    #[test]
    fn test_header_structure() {
        let header = authorization_header_with(
            &credentials(),
            "POST",
            "https://api.twitter.com/2/tweets",
            &[],
            "testnonce",
            "1318622958",
        );

        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_timestamp=\"1318622958\""));
        assert!(header.contains("oauth_nonce=\"testnonce\""));
        assert!(header.contains("oauth_version=\"1.0\""));
        assert!(header.contains("oauth_signature=\""));
    }

    #[test]
    fn test_signature_is_deterministic_for_fixed_inputs() {
        let args = (
            credentials(),
            "POST",
            "https://api.twitter.com/2/tweets",
            vec![],
            "nonce",
            "1700000000",
        );
        let a = authorization_header_with(&args.0, args.1, args.2, &args.3, args.4, args.5);
        let b = authorization_header_with(&args.0, args.1, args.2, &args.3, args.4, args.5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_query_params_change_signature() {
        let creds = credentials();
        let without = authorization_header_with(
            &creds,
            "GET",
            "https://api.twitter.com/2/tweets",
            &[],
            "nonce",
            "1700000000",
        );
        let with = authorization_header_with(
            &creds,
            "GET",
            "https://api.twitter.com/2/tweets",
            &[("ids".to_string(), "123".to_string())],
            "nonce",
            "1700000000",
        );
        assert_ne!(without, with);
    }

    #[test]
    fn test_random_nonce_is_hex_of_expected_length() {
        let nonce = generate_nonce();
        assert_eq!(nonce.len(), 32);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
