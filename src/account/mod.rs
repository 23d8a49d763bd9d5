//! Sign-in through an external OpenID provider, used only to show who is using the timer.
//!
//! The flow is the implicit one: the user opens [authorization_url] in a browser and the
//! provider redirects back with `#id_token=...` in the fragment. That fragment is pasted back
//! into stint and decoded by [parse_redirect].
//!
//! The token signature is NOT verified. The decoded [Account] is a display label for this
//! application and must never be used to authenticate anything.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use url::{form_urlencoded, Url};
use uuid::Uuid;

pub const DEFAULT_AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/#account";
pub const DEFAULT_SCOPES: &str = "openid email profile";

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub authorize_endpoint: Url,
    pub client_id: Option<String>,
    pub redirect_uri: String,
    pub scopes: String,
}

impl IdentityConfig {
    pub fn new(
        authorize_endpoint: &str,
        client_id: Option<String>,
        redirect_uri: String,
    ) -> Result<Self> {
        Ok(Self {
            authorize_endpoint: Url::parse(authorize_endpoint)
                .with_context(|| format!("Invalid authorization endpoint {authorize_endpoint}"))?,
            client_id,
            redirect_uri,
            scopes: DEFAULT_SCOPES.into(),
        })
    }
}

/// Name and email claims of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Account {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("unknown user")
    }
}

/// Fresh value for the `nonce` parameter.
pub fn new_nonce() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Builds the URL the user has to open to sign in.
pub fn authorization_url(config: &IdentityConfig, nonce: &str) -> Result<Url> {
    let client_id = config
        .client_id
        .as_deref()
        .ok_or_else(|| anyhow!("No client id configured, pass --client-id"))?;

    let mut url = config.authorize_endpoint.clone();
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("response_type", "id_token")
        .append_pair("scope", &config.scopes)
        .append_pair("nonce", nonce);
    Ok(url)
}

/// Extracts the account from the fragment the provider redirected to. Accepts the whole
/// redirect URL, the fragment with or without `#`, or a bare token.
pub fn parse_redirect(response: &str) -> Result<Account> {
    let response = response.trim();
    let fragment = match response.split_once('#') {
        Some((_, fragment)) => fragment,
        None => response,
    };

    if !fragment.contains('=') {
        return decode_id_token(fragment);
    }

    let mut token = None;
    for (key, value) in form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "error" => bail!("Sign-in was not completed: {value}"),
            "id_token" => token = Some(value.into_owned()),
            _ => {}
        }
    }

    let token = token.ok_or_else(|| anyhow!("Sign-in response has no id_token"))?;
    decode_id_token(&token)
}

/// Reads the claims of a JWT without checking the signature.
pub fn decode_id_token(token: &str) -> Result<Account> {
    let parts = token.split('.').collect::<Vec<_>>();
    if parts.len() != 3 {
        bail!("Invalid token: expected 3 parts, got {}", parts.len());
    }
    let payload = base64url_decode(parts[1])?;
    serde_json::from_slice::<Account>(&payload).context("Token payload is not valid JSON")
}

/// Base64url without padding, as used by JWT segments. Padding is tolerated.
fn base64url_decode(input: &str) -> Result<Vec<u8>> {
    fn value(c: u8) -> Option<u32> {
        match c {
            b'A'..=b'Z' => Some((c - b'A') as u32),
            b'a'..=b'z' => Some((c - b'a') as u32 + 26),
            b'0'..=b'9' => Some((c - b'0') as u32 + 52),
            b'-' | b'+' => Some(62),
            b'_' | b'/' => Some(63),
            _ => None,
        }
    }

    let mut out = Vec::with_capacity(input.len() * 3 / 4);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for c in input.bytes().filter(|c| *c != b'=') {
        let v = value(c).ok_or_else(|| anyhow!("Invalid base64 character {}", c as char))?;
        buffer = (buffer << 6) | v;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::{
        authorization_url, decode_id_token, parse_redirect, Account, IdentityConfig,
        DEFAULT_AUTHORIZE_ENDPOINT,
    };

    // {"name":"Ada Lovelace","email":"ada@example.com"}
    const PAYLOAD: &str = "eyJuYW1lIjoiQWRhIExvdmVsYWNlIiwiZW1haWwiOiJhZGFAZXhhbXBsZS5jb20ifQ";
    const HEADER: &str = "eyJhbGciOiJSUzI1NiJ9";

    fn token() -> String {
        format!("{HEADER}.{PAYLOAD}.c2lnbmF0dXJl")
    }

    fn ada() -> Account {
        Account {
            name: Some("Ada Lovelace".into()),
            email: Some("ada@example.com".into()),
        }
    }

    #[test]
    fn authorization_url_has_all_parameters() -> Result<()> {
        let config = IdentityConfig::new(
            DEFAULT_AUTHORIZE_ENDPOINT,
            Some("client-1".into()),
            "http://localhost:8080/#account".into(),
        )?;

        let url = authorization_url(&config, "abc")?;
        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert!(pairs.contains(&("client_id".into(), "client-1".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "http://localhost:8080/#account".into())));
        assert!(pairs.contains(&("response_type".into(), "id_token".into())));
        assert!(pairs.contains(&("scope".into(), "openid email profile".into())));
        assert!(pairs.contains(&("nonce".into(), "abc".into())));
        Ok(())
    }

    #[test]
    fn authorization_url_needs_client_id() -> Result<()> {
        let config = IdentityConfig::new(DEFAULT_AUTHORIZE_ENDPOINT, None, "x".into())?;
        assert!(authorization_url(&config, "abc").is_err());
        Ok(())
    }

    #[test]
    fn decodes_token_claims() -> Result<()> {
        assert_eq!(decode_id_token(&token())?, ada());
        Ok(())
    }

    #[test]
    fn parses_redirect_fragment() -> Result<()> {
        let redirect = format!(
            "http://localhost:8080/#id_token={}&authuser=0&prompt=none",
            token()
        );
        assert_eq!(parse_redirect(&redirect)?, ada());
        assert_eq!(parse_redirect(&format!("id_token={}", token()))?, ada());
        assert_eq!(parse_redirect(&token())?.display_name(), "Ada Lovelace");
        Ok(())
    }

    #[test]
    fn cancelled_sign_in_is_an_error() {
        let error = parse_redirect("#error=access_denied&state=x").unwrap_err();
        assert!(error.to_string().contains("access_denied"));

        assert!(parse_redirect("#state=x").is_err());
        assert!(parse_redirect("#id_token=only.two").is_err());
    }
}
