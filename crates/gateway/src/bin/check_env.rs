//! Environment checker
//!
//! Validates that the two required public configuration values are
//! present, non-placeholder and URL-shaped before local startup.
//! Exits 1 on any failure, 0 on success.

use std::process::ExitCode;

const REQUIRED: &[(&str, bool)] = &[
    // (variable, must be a URL)
    ("SITE_URL", true),
    ("SITE_ANON_KEY", false),
];

const PLACEHOLDER_MARKERS: &[&str] = &["your-", "changeme", "placeholder", "example.com"];

fn is_placeholder(value: &str) -> bool {
    let lowered = value.to_lowercase();
    PLACEHOLDER_MARKERS.iter().any(|marker| lowered.contains(marker))
}

fn is_url_shaped(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));

    match rest {
        Some(host) => !host.is_empty() && !host.contains(char::is_whitespace),
        None => false,
    }
}

fn check(name: &str, must_be_url: bool) -> Result<(), String> {
    let value = match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => return Err("missing or empty".to_string()),
    };

    if is_placeholder(&value) {
        return Err("still set to a placeholder value".to_string());
    }

    if must_be_url && !is_url_shaped(&value) {
        return Err("not a valid http(s) URL".to_string());
    }

    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let mut failed = false;

    for &(name, must_be_url) in REQUIRED {
        match check(name, must_be_url) {
            Ok(()) => println!("ok    {name}"),
            Err(reason) => {
                println!("FAIL  {name}: {reason}");
                failed = true;
            }
        }
    }

    if failed {
        println!("environment check failed");
        ExitCode::from(1)
    } else {
        println!("environment check passed");
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_shape() {
        assert!(is_url_shaped("https://samit.id"));
        assert!(is_url_shaped("http://localhost:3000"));
        assert!(!is_url_shaped("samit.id"));
        assert!(!is_url_shaped("https://"));
        assert!(!is_url_shaped("https://bad host"));
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder("https://your-project.supabase.co"));
        assert!(is_placeholder("CHANGEME"));
        assert!(!is_placeholder("https://samit.id"));
    }
}
