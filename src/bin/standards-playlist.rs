use chrono::Utc;
use clap::Parser;
use standards_playlist::auth::{self, AccessToken, SpotifyAuth, TokenStore};
use standards_playlist::{
    AssemblerConfig, CommitReport, CreatedPlaylist, FixedAnswer, InteractionPrompt,
    JazzStandardsClient, LinePrompt, NewPlaylist, PlaylistAssembler, PlaylistBuildState,
    PlaylistError, PlaylistTarget, PromptMode, RunConfig, RunStats, SourceCatalog,
    SpotifyClient, SpotifyCredentials,
};
use std::io::Write;
use std::time::Duration;

const EXIT_SETUP_FAILURE: i32 = 1;
const EXIT_COMMIT_FAILURE: i32 = 2;

/// Build a Spotify playlist from the recommended recordings of the top jazz standards
#[derive(Parser)]
#[command(
    name = "standards-playlist",
    about = "Build a Spotify playlist from jazzstandards.com recommended recordings",
    long_about = None
)]
struct Cli {
    /// Recordings to search per standard
    #[arg(long, default_value_t = AssemblerConfig::DEFAULT_MAX_RECOMMENDATIONS)]
    max_recordings: usize,

    /// Minimum delay between Spotify API calls, in milliseconds
    #[arg(long, default_value_t = 500)]
    rate_limit_ms: u64,

    /// Number of standards to read from the index
    #[arg(long, default_value_t = 100)]
    max_standards: usize,

    /// Name of the playlist to create
    #[arg(long, default_value = NewPlaylist::DEFAULT_NAME)]
    name: String,

    /// Description of the playlist to create
    #[arg(long, default_value = NewPlaylist::DEFAULT_DESCRIPTION)]
    description: String,

    /// Create the playlist as private
    #[arg(long)]
    private: bool,

    /// Append to this existing playlist instead of creating a new one
    #[arg(long, env = "STANDARDS_PLAYLIST_ID")]
    playlist_id: Option<String>,

    /// Accept every uncertain match without asking
    #[arg(long, conflicts_with = "no_prompt")]
    yes: bool,

    /// Reject every uncertain match without asking
    #[arg(long)]
    no_prompt: bool,

    /// Resolve tracks but don't create or change any playlist
    #[arg(long)]
    dry_run: bool,

    /// Show detailed debug information
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let prompt_mode = if self.yes {
            PromptMode::AcceptAll
        } else if self.no_prompt {
            PromptMode::RejectAll
        } else {
            PromptMode::Ask
        };

        RunConfig {
            max_recommendations_per_standard: self.max_recordings,
            search_interval: Duration::from_millis(self.rate_limit_ms),
            max_standards: self.max_standards,
            playlist: NewPlaylist::new(&self.name, &self.description, !self.private),
            playlist_id: self.playlist_id.clone(),
            prompt_mode,
            dry_run: self.dry_run,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn fail_setup(context: &str, error: &PlaylistError) -> ! {
    eprintln!("❌ {context}: {error}");
    std::process::exit(EXIT_SETUP_FAILURE);
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    init_logging(args.verbose);

    if args.verbose {
        println!("🔍 Verbose mode enabled");
    }

    let config = args.run_config();
    if let Err(e) = config.validate() {
        fail_setup("Invalid options", &e);
    }

    let credentials = match SpotifyCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            eprintln!();
            eprintln!("Please set the following environment variables:");
            eprintln!("  SPOTIFY_CLIENT_ID=your_client_id");
            eprintln!("  SPOTIFY_CLIENT_SECRET=your_client_secret");
            eprintln!(
                "  SPOTIFY_REDIRECT_URI=redirect URI registered for the app (default {})",
                SpotifyCredentials::DEFAULT_REDIRECT_URI
            );
            std::process::exit(EXIT_SETUP_FAILURE);
        }
    };

    let token = match load_or_authorize(credentials).await {
        Ok(token) => token,
        Err(e) => fail_setup("Spotify authorization failed", &e),
    };

    let spotify = SpotifyClient::new(
        Box::new(http_client::native::NativeClient::new()),
        token.access_token,
    )
    .with_min_interval(config.search_interval);
    let source = JazzStandardsClient::new(Box::new(http_client::native::NativeClient::new()))
        .with_max_standards(config.max_standards);

    println!("📚 Fetching jazz standards...");
    let standards = match source.fetch_standards().await {
        Ok(standards) => standards,
        Err(e) => fail_setup("Could not read the standards list", &e),
    };
    println!("✅ Found {} standards", standards.len());

    let (playlist, mut state) = match open_playlist(&spotify, &config).await {
        Ok(opened) => opened,
        Err(e) => fail_setup("Could not prepare the playlist", &e),
    };

    let prompt: Box<dyn InteractionPrompt> = match config.prompt_mode {
        PromptMode::Ask => Box::new(LinePrompt::terminal()),
        PromptMode::AcceptAll => Box::new(FixedAnswer(true)),
        PromptMode::RejectAll => Box::new(FixedAnswer(false)),
    };

    let assembler =
        PlaylistAssembler::new(&source, &spotify, prompt.as_ref(), config.assembler_config());
    let stats = assembler.assemble(&standards, &mut state).await;

    let Some(playlist) = playlist else {
        println!();
        println!("🧪 Dry run, nothing was added. Tracks that would be added:");
        for (i, id) in state.track_ids().iter().enumerate() {
            println!("  {:>3}. {}", i + 1, standards_playlist::types::track_uri(id));
        }
        print_summary(&stats, None, None);
        return;
    };

    println!();
    println!("💾 Adding {} tracks to the playlist...", state.len());
    match assembler.commit(&spotify, &playlist.id, &state).await {
        Ok(report) => print_summary(&stats, Some(&report), Some(&playlist)),
        Err(e) => {
            print_summary(&stats, None, Some(&playlist));
            eprintln!("❌ {e}");
            if let PlaylistError::Commit { track_ids, .. } = &e {
                eprintln!("   Tracks in the failed chunk (add them manually or re-run with --playlist-id):");
                for id in track_ids {
                    eprintln!("     {}", standards_playlist::types::track_uri(id));
                }
            }
            std::process::exit(EXIT_COMMIT_FAILURE);
        }
    }
}

/// Use the cached token when it is still good, refresh it when it has
/// expired, and fall back to the interactive authorization flow.
async fn load_or_authorize(credentials: SpotifyCredentials) -> standards_playlist::Result<AccessToken> {
    let auth = SpotifyAuth::new(Box::new(http_client::native::NativeClient::new()), credentials);
    let store = TokenStore::default_location()?;

    if store.exists() {
        println!("📁 Found cached Spotify token, attempting to restore...");
        match store.load() {
            Ok(token) if !token.covers_scopes(auth::SCOPES) => {
                println!("❌ Cached token is missing required permissions");
            }
            Ok(token) if !token.is_expired(Utc::now()) => {
                println!("✅ Using cached token");
                return Ok(token);
            }
            Ok(token) => match auth.refresh(&token).await {
                Ok(fresh) => {
                    println!("🔄 Refreshed cached token");
                    save_token(&store, &fresh);
                    return Ok(fresh);
                }
                Err(e) => println!("❌ Failed to refresh token: {e}"),
            },
            Err(e) => println!("❌ Failed to load cached token: {e}"),
        }
        discard_token(&store);
    }

    let state = auth::new_state();
    println!("🔐 Open this URL in your browser and approve access:");
    println!();
    println!("   {}", auth.authorize_url(&state));
    println!();
    print!("Paste the URL you were redirected to: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let code = auth::parse_redirect(&line, &state)?;

    let token = auth.exchange_code(&code).await?;
    println!("✅ Authorized with Spotify");
    save_token(&store, &token);
    Ok(token)
}

fn save_token(store: &TokenStore, token: &AccessToken) {
    if let Err(e) = store.save(token) {
        println!("⚠️  Warning: Failed to save token: {e}");
        println!("   (You'll need to authorize again next time)");
    }
}

fn discard_token(store: &TokenStore) {
    if let Err(e) = store.remove() {
        println!("⚠️  Warning: Failed to remove cached token: {e}");
        println!("   (Delete {} by hand if authorization keeps failing)", store.path().display());
    }
}

/// Create the playlist, or read what an existing one already holds.
/// Returns no playlist for dry runs.
async fn open_playlist(
    spotify: &SpotifyClient,
    config: &RunConfig,
) -> standards_playlist::Result<(Option<CreatedPlaylist>, PlaylistBuildState)> {
    if config.dry_run {
        return Ok((None, PlaylistBuildState::new()));
    }

    if let Some(id) = &config.playlist_id {
        println!("📋 Reading existing playlist {id}...");
        let existing = spotify.playlist_track_ids(id).await.map_err(|e| {
            PlaylistError::PlaylistCreate(format!("Could not read playlist {id}: {e}"))
        })?;
        println!("✅ Playlist already holds {} tracks", existing.len());
        let playlist = CreatedPlaylist {
            id: id.clone(),
            url: Some(format!("https://open.spotify.com/playlist/{id}")),
        };
        return Ok((Some(playlist), PlaylistBuildState::with_existing(existing)));
    }

    println!("🎶 Creating playlist '{}'...", config.playlist.name);
    let playlist = spotify.create_playlist(&config.playlist).await?;
    if let Some(url) = &playlist.url {
        println!("✅ Created playlist: {url}");
    }
    Ok((Some(playlist), PlaylistBuildState::new()))
}

fn print_summary(stats: &RunStats, report: Option<&CommitReport>, playlist: Option<&CreatedPlaylist>) {
    println!();
    println!("{}", "=".repeat(60));
    println!("🎉 Done!");
    println!("📊 Statistics:");
    println!("   - Jazz standards processed: {}", stats.standards_processed);
    if !stats.standards_skipped.is_empty() {
        println!("   - Standards skipped: {}", stats.standards_skipped.len());
        for (title, reason) in &stats.standards_skipped {
            println!("       {title}: {reason}");
        }
    }
    println!("   - Recordings searched: {}", stats.recommendations_searched);
    if stats.recommendations_over_ceiling > 0 {
        println!(
            "   - Recordings over the per-standard limit: {}",
            stats.recommendations_over_ceiling
        );
    }
    println!("   - Auto-accepted matches: {}", stats.auto_accepted);
    println!(
        "   - Confirmed / declined by you: {} / {}",
        stats.user_accepted, stats.user_rejected
    );
    println!("   - No match found: {}", stats.rejected);
    if stats.search_failures > 0 {
        println!("   - Failed searches: {}", stats.search_failures);
    }
    println!("   - Duplicates skipped: {}", stats.duplicates_skipped);
    match report {
        Some(report) => println!(
            "   - Tracks added to playlist: {} (in {} requests)",
            report.tracks_committed, report.chunks_committed
        ),
        None => println!("   - Tracks resolved: {}", stats.tracks_added),
    }
    if let Some(url) = playlist.and_then(|p| p.url.as_deref()) {
        println!("   - Playlist: {url}");
    }
    println!("{}", "=".repeat(60));
}
