use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("varco")
        .about("Admin entry gate")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("VARCO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("slug")
                .short('s')
                .long("slug")
                .help("Entry slug, the flow lives at /admin/enter/<slug>")
                .env("VARCO_SLUG")
                .required(true),
        )
        .arg(
            Arg::new("entry-secret")
                .long("entry-secret")
                .help("Shared secret required to request an entry code")
                .env("VARCO_ENTRY_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("signing-key")
                .long("signing-key")
                .help("HMAC key for gate tokens; the service refuses to start without one")
                .env("VARCO_SIGNING_KEY")
                .required(true),
        )
        .arg(
            Arg::new("admin-email")
                .long("admin-email")
                .help("Address that receives the one-time entry codes")
                .env("VARCO_ADMIN_EMAIL"),
        )
        .arg(
            Arg::new("gate-ttl")
                .long("gate-ttl")
                .help("Lifetime of the admin-gate cookie in seconds")
                .default_value("300")
                .env("VARCO_GATE_TTL")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Public base URL; https enables the Secure cookie attribute")
                .default_value("http://localhost:8080")
                .env("VARCO_BASE_URL"),
        )
        .arg(
            Arg::new("sign-in-url")
                .long("sign-in-url")
                .help("Primary sign-in page used for unauthorized redirects")
                .default_value("/login")
                .env("VARCO_SIGN_IN_URL"),
        )
        .arg(
            Arg::new("mail-url")
                .long("mail-url")
                .help("HTTP mail delivery endpoint; without it codes are logged instead of sent")
                .env("VARCO_MAIL_URL"),
        )
        .arg(
            Arg::new("session-secret")
                .long("session-secret")
                .help("Verification key for the primary auth system's role claims")
                .env("VARCO_SESSION_SECRET"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("VARCO_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
