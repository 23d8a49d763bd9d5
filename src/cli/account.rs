use anyhow::Result;
use tracing::warn;

use crate::{
    account::{authorization_url, new_nonce, parse_redirect},
    config::IdentityArgs,
};

/// Command to process `login`. Only prints the URL; the browser round trip happens outside.
pub fn process_login_command(identity: IdentityArgs) -> Result<()> {
    let url = authorization_url(&identity.to_config()?, &new_nonce())?;
    println!("Open this URL to sign in:\n{url}");
    println!("Afterwards run `stint account --response <the address you were sent back to>`");
    Ok(())
}

/// Command to process `account`. A failed sign-in is reported once and not retried.
pub fn process_account_command(response: &str) -> Result<()> {
    match parse_redirect(response) {
        Ok(account) => {
            println!("Signed in as {}", account.display_name());
            if let Some(email) = account.email {
                println!("Email {email}");
            }
        }
        Err(e) => {
            warn!("Sign-in failed {e:?}");
            eprintln!("Sign-in failed: {e}");
        }
    }
    Ok(())
}
