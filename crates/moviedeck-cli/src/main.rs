//! moviedeck - movie catalog, account and "my list" CLI.

/// Application configuration (TOML).
mod config;
/// Store wiring shared by the subcommands.
mod context;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::context::AppContext;
use moviedeck_api::backend::{MediaKind, Registration, UserUpdate};
use moviedeck_api::tmdb::{
    BackdropSize, Endpoint, LocalTmdbApi, PosterSize, TimeWindow, TmdbClient, TmdbMedia, TmdbPage,
    TmdbVideo, TrendingMedia, image_url,
};
use moviedeck_store::StoreError;

/// CLI argument parser.
#[derive(Parser)]
#[command(name = "moviedeck", about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Keep the session in memory only (nothing is persisted).
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Synthesize auth responses locally.
    #[arg(long, global = true, overrides_with = "no_mock")]
    mock: bool,

    /// Use the real auth backend.
    #[arg(long, global = true, overrides_with = "mock")]
    no_mock: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Mock override from the command line, if any.
    const fn mock_override(&self) -> Option<bool> {
        if self.mock {
            Some(true)
        } else if self.no_mock {
            Some(false)
        } else {
            None
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Sign in.
    Login(LoginArgs),
    /// Create an account.
    Register(RegisterArgs),
    /// Sign out.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Manage the signed-in account.
    Account(AccountCommand),
    /// Manage "my list".
    Mylist(MyListCommand),
    /// Browse the TMDB catalog.
    Tmdb(TmdbCommand),
    /// Print shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the `login` subcommand.
#[derive(clap::Args)]
struct LoginArgs {
    /// Email address.
    #[arg(long)]
    email: String,
    /// Password.
    #[arg(long)]
    password: String,
}

/// Arguments for the `register` subcommand.
#[derive(clap::Args)]
struct RegisterArgs {
    /// Display name.
    #[arg(long)]
    name: String,
    /// Email address.
    #[arg(long)]
    email: String,
    /// Password.
    #[arg(long)]
    password: String,
    /// Password confirmation.
    #[arg(long)]
    password_confirmation: String,
}

/// Arguments for the `account` subcommand.
#[derive(clap::Args)]
struct AccountCommand {
    /// Account subcommand to run.
    #[command(subcommand)]
    command: AccountSubcommands,
}

/// Available account subcommands.
#[derive(Subcommand)]
enum AccountSubcommands {
    /// Update profile fields or the password.
    Update(AccountUpdateArgs),
}

/// Arguments for the `account update` subcommand.
#[derive(clap::Args)]
struct AccountUpdateArgs {
    /// New display name.
    #[arg(long)]
    name: Option<String>,
    /// New email address.
    #[arg(long)]
    email: Option<String>,
    /// New password.
    #[arg(long, requires = "confirm_password")]
    new_password: Option<String>,
    /// New password confirmation.
    #[arg(long)]
    confirm_password: Option<String>,
    /// Current password.
    #[arg(long)]
    current_password: Option<String>,
}

/// Arguments for the `mylist` subcommand.
#[derive(clap::Args)]
struct MyListCommand {
    /// My-list subcommand to run.
    #[command(subcommand)]
    command: MyListSubcommands,
}

/// Available my-list subcommands.
#[derive(Subcommand)]
enum MyListSubcommands {
    /// List saved items.
    List,
    /// Save an item.
    Add(ItemArgs),
    /// Remove a saved item.
    Remove(ItemArgs),
    /// Check whether an item is saved.
    Check(ItemArgs),
}

/// Item selector shared by the my-list subcommands.
#[derive(clap::Args)]
struct ItemArgs {
    /// TMDB id.
    #[arg(long)]
    id: u64,
    /// Item kind (`movie` or `tv`).
    #[arg(long, default_value = "movie")]
    kind: MediaKind,
}

/// Arguments for the `tmdb` subcommand.
#[derive(clap::Args)]
struct TmdbCommand {
    /// TMDB subcommand to run.
    #[command(subcommand)]
    command: TmdbSubcommands,
}

/// Available TMDB subcommands.
#[derive(Subcommand)]
enum TmdbSubcommands {
    /// Trending titles.
    Trending(TrendingArgs),
    /// One home-screen row (e.g. `netflix-originals`, `comedy`).
    Row(RowArgs),
    /// List the available rows.
    Rows,
    /// Movie details and trailer.
    Movie(IdArgs),
    /// Series details.
    Tv(IdArgs),
    /// Movies similar to a movie.
    Similar(IdArgs),
    /// Search movies, series and people.
    Search(SearchArgs),
    /// Movie genres.
    Genres,
}

/// Media filter for `tmdb trending`.
#[derive(Clone, Copy, ValueEnum)]
enum MediaArg {
    /// Movies and series.
    All,
    /// Movies only.
    Movie,
    /// Series only.
    Tv,
}

/// Time window for `tmdb trending`.
#[derive(Clone, Copy, ValueEnum)]
enum WindowArg {
    /// Last day.
    Day,
    /// Last week.
    Week,
}

/// Arguments for the `tmdb trending` subcommand.
#[derive(clap::Args)]
struct TrendingArgs {
    /// Media filter.
    #[arg(long, value_enum, default_value_t = MediaArg::All)]
    media: MediaArg,
    /// Time window.
    #[arg(long, value_enum, default_value_t = WindowArg::Week)]
    window: WindowArg,
}

/// Arguments for the `tmdb row` subcommand.
#[derive(clap::Args)]
struct RowArgs {
    /// Row name.
    endpoint: Endpoint,
}

/// Arguments taking a TMDB id.
#[derive(clap::Args)]
struct IdArgs {
    /// TMDB id.
    id: u64,
}

/// Arguments for the `tmdb search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query.
    query: String,
    /// Result page.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for the `completions` subcommand.
#[derive(clap::Args)]
struct CompletionsArgs {
    /// Target shell.
    shell: clap_complete::Shell,
}

/// Runs the `login` subcommand.
///
/// # Errors
///
/// Returns an error if the session cannot be opened or sign-in fails.
#[instrument(skip_all)]
async fn run_login(ctx: &AppContext, args: &LoginArgs) -> Result<()> {
    let session = ctx.session().await?;
    let user = session.login(&args.email, &args.password).await?;
    tracing::info!("Signed in as {} <{}>", user.name, user.email);
    Ok(())
}

/// Runs the `register` subcommand.
///
/// The form is validated before anything is opened or sent.
///
/// # Errors
///
/// Returns an error if validation or registration fails.
#[instrument(skip_all)]
async fn run_register(ctx: &AppContext, args: RegisterArgs) -> Result<()> {
    let registration = Registration {
        name: args.name,
        email: args.email,
        password: args.password,
        password_confirmation: args.password_confirmation,
    };
    registration.validate().map_err(StoreError::from)?;

    let session = ctx.session().await?;
    if let Err(err) = session.register(&registration).await {
        if let Some(fields) = err.field_errors() {
            for (field, messages) in fields {
                tracing::error!("{field}: {}", messages.join(", "));
            }
        }
        return Err(err.into());
    }
    tracing::info!("Account created. Sign in with `moviedeck login`.");
    Ok(())
}

/// Runs the `logout` subcommand.
///
/// # Errors
///
/// Returns an error if the persisted session cannot be cleared.
#[instrument(skip_all)]
async fn run_logout(ctx: &AppContext) -> Result<()> {
    let session = ctx.session().await?;
    session.logout().await?;
    tracing::info!("Signed out");
    Ok(())
}

/// Runs the `whoami` subcommand.
///
/// # Errors
///
/// Returns an error if the profile cannot be refreshed.
#[instrument(skip_all)]
async fn run_whoami(ctx: &AppContext) -> Result<()> {
    let session = ctx.session().await?;
    if !session.is_authenticated() {
        tracing::info!("Not signed in");
        return Ok(());
    }
    let user = session.refresh_user().await?;
    tracing::info!("{} <{}> (id {})", user.name, user.email, user.id);
    if let Some(created_at) = user.created_at.as_deref() {
        tracing::info!("Member since {created_at}");
    }
    Ok(())
}

/// Runs the `account update` subcommand.
///
/// # Errors
///
/// Returns an error if validation or the update fails.
#[instrument(skip_all)]
async fn run_account_update(ctx: &AppContext, args: AccountUpdateArgs) -> Result<()> {
    let updates = UserUpdate {
        name: args.name,
        email: args.email,
        password: args.new_password,
        password_confirmation: args.confirm_password,
        current_password: args.current_password,
    };
    if updates.is_empty() {
        bail!("nothing to update: pass --name, --email or --new-password");
    }
    updates.validate().map_err(StoreError::from)?;

    let session = ctx.session().await?;
    let user = session.update_user(&updates).await?;
    tracing::info!("Profile updated: {} <{}>", user.name, user.email);
    Ok(())
}

/// Runs the `mylist` subcommands.
///
/// # Errors
///
/// Returns an error if no session is active, the list cannot be loaded, or
/// the backend rejects a change.
#[instrument(skip_all)]
async fn run_mylist(ctx: &AppContext, command: MyListSubcommands) -> Result<()> {
    let session = ctx.session().await?;
    if !session.is_authenticated() {
        return Err(StoreError::AuthenticationRequired.into());
    }
    let list = ctx.collection(&session)?;
    list.sync_with_session()
        .await
        .context("failed to load My List")?;

    match command {
        MyListSubcommands::List => {
            let items = list.items();
            if items.is_empty() {
                tracing::info!("My List is empty");
                return Ok(());
            }
            tracing::info!("Kind\tID\tAdded");
            for item in &items {
                tracing::info!(
                    "{}\t{}\t{}",
                    item.media_type,
                    item.tmdb_id,
                    item.added_at.as_deref().unwrap_or("-")
                );
            }
            tracing::info!("Total: {} items", items.len());
        }
        MyListSubcommands::Add(item) => {
            let change = list.add_to_my_list(item.id, item.kind).await?;
            tracing::info!("{change}");
        }
        MyListSubcommands::Remove(item) => {
            let change = list.remove_from_my_list(item.id, item.kind).await?;
            tracing::info!("{change}");
        }
        MyListSubcommands::Check(item) => {
            if list.is_in_my_list(item.id, item.kind) {
                tracing::info!("{}-{} is in My List", item.kind, item.id);
            } else {
                tracing::info!("{}-{} is not in My List", item.kind, item.id);
            }
        }
    }
    Ok(())
}

/// Prints a page of listing results.
fn print_page(page: &TmdbPage<TmdbMedia>) {
    tracing::info!("ID\tType\tDate\t\tRating\tTitle");
    for media in &page.results {
        tracing::info!(
            "{}\t{}\t{}\t{:.1}\t{}",
            media.id,
            media.media_type.as_deref().unwrap_or("-"),
            media.date().unwrap_or("-\t"),
            media.vote_average,
            media.display_title()
        );
    }
    tracing::info!(
        "Page {}/{} ({} results)",
        page.page,
        page.total_pages,
        page.total_results
    );
}

/// Prints movie details with poster and trailer links.
///
/// # Errors
///
/// Returns an error if either API request fails.
async fn print_movie(client: &TmdbClient, movie_id: u64) -> Result<()> {
    let details = client.movie_details(movie_id).await?;
    let videos = client.movie_videos(movie_id).await?;

    tracing::info!("ID: {}", details.id);
    tracing::info!("Title: {}", details.title);
    if let Some(tagline) = details.tagline.as_deref().filter(|t| !t.is_empty()) {
        tracing::info!("Tagline: {tagline}");
    }
    tracing::info!("Release: {}", details.release_date.as_deref().unwrap_or("-"));
    if let Some(runtime) = details.runtime {
        tracing::info!("Runtime: {runtime} min");
    }
    let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
    tracing::info!("Genres: {}", genres.join(", "));
    tracing::info!("Rating: {:.1}", details.vote_average);
    if let Some(poster) = image_url(details.poster_path.as_deref(), PosterSize::W500) {
        tracing::info!("Poster: {poster}");
    }
    if let Some(backdrop) = image_url(details.backdrop_path.as_deref(), BackdropSize::W1280) {
        tracing::info!("Backdrop: {backdrop}");
    }
    if let Some(url) = videos.trailer().and_then(TmdbVideo::watch_url) {
        tracing::info!("Trailer: {url}");
    }
    tracing::info!("---");
    tracing::info!("{}", details.overview.as_deref().unwrap_or(""));
    Ok(())
}

/// Runs the `tmdb` subcommands.
///
/// # Errors
///
/// Returns an error if TMDB credentials are missing or the API request fails.
#[instrument(skip_all)]
async fn run_tmdb(ctx: &AppContext, command: TmdbSubcommands) -> Result<()> {
    if matches!(command, TmdbSubcommands::Rows) {
        for endpoint in Endpoint::ALL {
            tracing::info!("{endpoint}");
        }
        return Ok(());
    }

    let client = ctx.tmdb_client()?;
    match command {
        TmdbSubcommands::Trending(args) => {
            let media = match args.media {
                MediaArg::All => TrendingMedia::All,
                MediaArg::Movie => TrendingMedia::Movie,
                MediaArg::Tv => TrendingMedia::Tv,
            };
            let window = match args.window {
                WindowArg::Day => TimeWindow::Day,
                WindowArg::Week => TimeWindow::Week,
            };
            print_page(&client.trending(media, window).await?);
        }
        TmdbSubcommands::Row(args) => print_page(&client.fetch_row(args.endpoint).await?),
        TmdbSubcommands::Movie(args) => print_movie(&client, args.id).await?,
        TmdbSubcommands::Tv(args) => {
            let details = client.tv_details(args.id).await?;
            tracing::info!("ID: {}", details.id);
            tracing::info!("Name: {}", details.name);
            tracing::info!(
                "First aired: {}",
                details.first_air_date.as_deref().unwrap_or("-")
            );
            tracing::info!("Seasons: {}", details.number_of_seasons);
            tracing::info!("Episodes: {}", details.number_of_episodes);
            tracing::info!("---");
            tracing::info!("{}", details.overview.as_deref().unwrap_or(""));
        }
        TmdbSubcommands::Similar(args) => print_page(&client.similar_movies(args.id, 1).await?),
        TmdbSubcommands::Search(args) => {
            print_page(&client.search_multi(&args.query, args.page).await?);
        }
        TmdbSubcommands::Genres => {
            for genre in client.movie_genres().await? {
                tracing::info!("{}\t{}", genre.id, genre.name);
            }
        }
        TmdbSubcommands::Rows => {}
    }
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    if let Commands::Completions(args) = &cli.command {
        clap_complete::generate(
            args.shell,
            &mut Cli::command(),
            "moviedeck",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let ctx = AppContext::load(cli.dir.clone(), cli.ephemeral, cli.mock_override())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Login(args) => run_login(&ctx, &args).await,
        Commands::Register(args) => run_register(&ctx, args).await,
        Commands::Logout => run_logout(&ctx).await,
        Commands::Whoami => run_whoami(&ctx).await,
        Commands::Account(account) => match account.command {
            AccountSubcommands::Update(args) => run_account_update(&ctx, args).await,
        },
        Commands::Mylist(mylist) => run_mylist(&ctx, mylist.command).await,
        Commands::Tmdb(tmdb) => run_tmdb(&ctx, tmdb.command).await,
        Commands::Completions(_) => Ok(()),
    }
}
