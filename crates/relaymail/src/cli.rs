//! Command-line interface.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use clap::Parser;

/// Long options that take a value and may be written with a single dash.
const VALUE_OPTIONS: &[&str] = &["to", "subject", "body", "config"];

/// Long flags that may be written with a single dash.
const FLAG_OPTIONS: &[&str] = &["verbose", "tls-verify"];

/// Command-line arguments.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Send one e-mail through an authenticated SMTP relay",
    long_about = "Reads the message body from a file or standard input and relays it through \
                  the server named in the configuration file, using STARTTLS and AUTH LOGIN."
)]
pub struct Cli {
    /// Configuration file [default: ~/.config/relaymail/config.json]
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subject of the e-mail
    #[arg(long, default_value = "")]
    pub subject: String,

    /// File containing the body of the e-mail [default: standard input]
    #[arg(long, value_name = "PATH")]
    pub body: Option<PathBuf>,

    /// Comma separated recipients list
    #[arg(long, value_name = "ADDRESSES", default_value = "")]
    pub to: String,

    /// Log protocol steps to standard error
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Verify the relay's TLS certificate against the system roots
    #[arg(long = "tls-verify")]
    pub tls_verify: bool,
}

impl Cli {
    /// Parses the process arguments, accepting single-dash long options.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }
}

/// Rewrites `-to x` / `-to=x` style options to `--to=x`.
///
/// A value-taking option always consumes the following argument, even one
/// that starts with a dash, so `-subject -verbose` sets the subject. `-c`
/// followed by a path is handled the same way. Anything else is passed
/// through unchanged, as is everything after `--`.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    let mut out: Vec<OsString> = args.next().into_iter().collect();
    while let Some(arg) = args.next() {
        match classify(&arg) {
            Token::Separator => {
                out.push(arg);
                out.extend(args);
                break;
            }
            Token::Flag(name) => out.push(format!("--{name}").into()),
            Token::Joined(name, value) => out.push(format!("--{name}={value}").into()),
            Token::Value(name) => match args.next() {
                Some(value) => {
                    let mut joined = OsString::from(format!("--{name}="));
                    joined.push(value);
                    out.push(joined);
                }
                // Let clap report the missing value
                None => out.push(format!("--{name}").into()),
            },
            Token::Other => out.push(arg),
        }
    }
    out
}

enum Token {
    Separator,
    Flag(&'static str),
    Value(&'static str),
    Joined(&'static str, String),
    Other,
}

fn classify(arg: &OsStr) -> Token {
    let Some(text) = arg.to_str() else {
        return Token::Other;
    };
    if text == "--" {
        return Token::Separator;
    }
    if text == "-c" {
        return Token::Value("config");
    }
    let Some(name) = text.strip_prefix("--").or_else(|| text.strip_prefix('-')) else {
        return Token::Other;
    };
    let (key, value) = match name.split_once('=') {
        Some((key, value)) => (key, Some(value)),
        None => (name, None),
    };
    if let Some(&option) = VALUE_OPTIONS.iter().find(|&&option| option == key) {
        return value.map_or(Token::Value(option), |value| {
            Token::Joined(option, value.to_string())
        });
    }
    match FLAG_OPTIONS.iter().find(|&&flag| flag == key) {
        Some(&flag) if value.is_none() => Token::Flag(flag),
        _ => Token::Other,
    }
}
