use std::env;
use std::process::exit;

use fortune_core::signature::{sign, signing_message, SIGNATURE_PARAM};

fn main() {
    let args: Vec<String> = env::args().collect();
    let task = args.get(1).map(|s| s.as_str()).unwrap_or("");

    match task {
        "sign-query" => sign_query(&args[2..]),
        _ => usage(),
    }
}

fn usage() -> ! {
    eprintln!("Usage: cargo run -p xtask -- sign-query key=value [key=value ...]");
    eprintln!("       (reads SHOPIFY_API_SECRET from the environment or .env)");
    exit(1);
}

/// Print a proxy query string signed the way the storefront proxy signs it,
/// for exercising a local server with curl.
fn sign_query(pairs: &[String]) {
    dotenv::dotenv().ok();
    let secret = match env::var("SHOPIFY_API_SECRET") {
        Ok(s) if !s.trim().is_empty() => s,
        _ => {
            eprintln!("SHOPIFY_API_SECRET is not set");
            exit(1);
        }
    };

    let mut params = Vec::with_capacity(pairs.len());
    for pair in pairs {
        match pair.split_once('=') {
            Some((k, v)) if !k.is_empty() => params.push((k.to_string(), v.to_string())),
            _ => {
                eprintln!("not a key=value pair: {pair}");
                usage();
            }
        }
    }
    if params.is_empty() {
        usage();
    }

    println!("{}", signed_query(&params, &secret));
}

fn signed_query(params: &[(String, String)], secret: &str) -> String {
    let signature = sign(&signing_message(params), secret);
    let mut query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    query.push(format!("{SIGNATURE_PARAM}={signature}"));
    query.join("&")
}
