//! Passwordless sign-in callback detection

use clearhold_domain::constants::MAGIC_LINK_MODE;
use clearhold_domain::MagicLinkCallback;
use url::Url;

/// Base used to resolve callbacks given as a bare path or query string
const RELATIVE_BASE: &str = "http://localhost/";

/// Parse a callback URL of the form `...?mode=signIn&oobCode=CODE`
///
/// `code` is accepted in place of `oobCode`. Returns `None` for anything that
/// is not a sign-in link.
pub fn parse_callback(link: &str) -> Option<MagicLinkCallback> {
    let link = link.trim();
    let url = Url::parse(link)
        .or_else(|_| Url::parse(RELATIVE_BASE).and_then(|base| base.join(link)))
        .ok()?;

    let mut mode = None;
    let mut oob_code = None;
    let mut code = None;
    let mut continue_url = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "mode" => mode = Some(value.into_owned()),
            "oobCode" => oob_code = Some(value.into_owned()),
            "code" => code = Some(value.into_owned()),
            "continueUrl" => continue_url = Some(value.into_owned()),
            _ => {}
        }
    }

    if mode.as_deref() != Some(MAGIC_LINK_MODE) {
        return None;
    }
    let code = oob_code.or(code).filter(|c| !c.is_empty())?;
    Some(MagicLinkCallback { code, continue_url })
}

/// True when `link` carries a sign-in code
pub fn is_sign_in_link(link: &str) -> bool {
    parse_callback(link).is_some()
}
