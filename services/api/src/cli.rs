use crate::server;
use admissions::config::AppConfig;
use admissions::error::AppError;
use admissions::identity::{ApplicantId, Role, TokenIssuer};
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "admissions-api",
    about = "Run the admissions service or mint bearer tokens for operators",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Mint a bearer token signed with the configured secret
    Token(TokenArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct TokenArgs {
    /// Account id placed in the `sub` claim
    #[arg(long)]
    pub(crate) subject: Uuid,
    /// Role placed in the `role` claim (applicant or staff)
    #[arg(long, value_parser = parse_role, default_value = "applicant")]
    pub(crate) role: Role,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role '{raw}', expected applicant or staff"))
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Token(args) => mint_token(args),
    }
}

fn mint_token(args: TokenArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let issuer = TokenIssuer::new(config.auth.jwt_secret, config.auth.token_ttl_mins);
    let token = issuer.issue(ApplicantId(args.subject), args.role)?;

    println!("{}", token.access_token);
    eprintln!(
        "role={} expires_at={}",
        args.role.label(),
        token.expires_at
    );
    Ok(())
}
