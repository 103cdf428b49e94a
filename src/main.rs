use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use blindtest::game::{fetch_tracks, shuffle};
use blindtest::{
    Config, GameController, GameSummary, Phase, SpotifyClient, TrackSelection, TrackSource,
    WebApiSource,
};

#[derive(Parser)]
#[command(name = "blindtest")]
#[command(about = "Blind test game on your Spotify tracks")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a blind test on your saved tracks or a playlist
    Play {
        /// Playlist URL, URI or ID (defaults to your saved tracks)
        #[arg(long)]
        playlist: Option<String>,

        /// Play tracks in their original order
        #[arg(long)]
        no_shuffle: bool,

        /// Seed for the shuffle, to replay the same order
        #[arg(long)]
        seed: Option<u64>,

        /// Stop after this many tracks
        #[arg(long)]
        max_tracks: Option<usize>,

        /// Print the final summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all your Spotify playlists
    ListPlaylists,

    /// Show setup guide
    Setup,
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Play {
            playlist,
            no_shuffle,
            seed,
            max_tracks,
            json,
        } => {
            let options = PlayOptions {
                shuffled: !no_shuffle,
                seed,
                max_tracks,
                json,
            };
            play(playlist.as_deref(), &options).await?;
        }
        Commands::ListPlaylists => {
            list_playlists().await?;
        }
        Commands::Setup => {
            show_setup_guide();
        }
    }

    Ok(())
}

struct PlayOptions {
    shuffled: bool,
    seed: Option<u64>,
    max_tracks: Option<usize>,
    json: bool,
}

async fn play(playlist: Option<&str>, options: &PlayOptions) -> Result<()> {
    println!("{}", "Spotify Blind Test".cyan().bold());
    println!("{}", "=".repeat(50));

    let config = Config::from_env().context("Failed to load configuration")?;

    let missing = config.get_missing_config();
    if !missing.is_empty() {
        println!("{}", "Missing configuration:".red());
        for item in &missing {
            println!("   - {}", item);
        }
        println!(
            "\n{}",
            "Set SPOTIFY_ACCESS_TOKEN, or the client credentials, in your .env file.".yellow()
        );
        std::process::exit(1);
    }

    let selection = TrackSelection::from_arg(playlist).context("Invalid playlist")?;
    let mut game = GameController::new(config.scoring);

    match config.bearer_token() {
        Some(token) => {
            game.mark_authenticated();
            let source = WebApiSource::new(token, selection);
            run_game(&mut game, &source, options).await
        }
        None => {
            let client = SpotifyClient::new(&config)
                .await
                .context("Failed to connect to Spotify")?;
            game.mark_authenticated();
            let source = client.source(selection);
            run_game(&mut game, &source, options).await
        }
    }
}

async fn run_game<S: TrackSource>(
    game: &mut GameController,
    source: &S,
    options: &PlayOptions,
) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Invalid progress template")?,
    );
    spinner.set_message(format!("Fetching {}...", source.describe()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let ticket = game.begin_fetch();
    let fetched = fetch_tracks(source, &ticket).await.unwrap_or_default();
    spinner.finish_and_clear();

    let mut tracks = match (options.shuffled, options.seed) {
        (false, _) => fetched,
        (true, Some(seed)) => shuffle(&fetched, &mut StdRng::seed_from_u64(seed)),
        (true, None) => shuffle(&fetched, &mut rand::thread_rng()),
    };
    if let Some(max) = options.max_tracks {
        tracks.truncate(max);
    }

    let started_at = Local::now();
    game.finish_fetch(&ticket, tracks)?;

    if game.phase() == Phase::GameComplete {
        println!("{}", "No playable tracks found".yellow());
        return Ok(());
    }

    println!("Type your guesses. {} passes, {} ends the game.", ":skip".bold(), ":quit".bold());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while matches!(game.phase(), Phase::Playing | Phase::RoundComplete) {
        print_round_header(game);

        loop {
            print!("> ");
            io::stdout().flush()?;

            let Some(line) = lines.next().transpose()? else {
                game.end_game();
                break;
            };

            match line.trim() {
                ":quit" | ":q" => {
                    reveal(game);
                    game.end_game();
                    break;
                }
                ":skip" | ":s" => {
                    reveal(game);
                    game.skip();
                    break;
                }
                "" => continue,
                answer => {
                    let awarded = game.submit_answer(answer);
                    print_feedback(game, awarded);

                    if game.is_round_complete() {
                        println!("{}", "Round complete!".green().bold());
                        game.advance();
                        break;
                    }
                }
            }
        }
    }

    let summary = GameSummary::new(source.describe(), started_at, game);
    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn print_round_header(game: &GameController) {
    let Some(track) = game.current_track() else {
        return;
    };

    println!();
    println!(
        "{}",
        format!(
            "Track {} ({} left)",
            game.tracks_dealt(),
            game.tracks_remaining()
        )
        .cyan()
        .bold()
    );
    match &track.preview_url {
        Some(url) => println!("Listen: {}", url),
        None => println!("{}", "No preview available for this track".yellow()),
    }
    print_status(game);
}

fn print_status(game: &GameController) {
    println!(
        "Score: {:.2} | Artists: {}/{} | Title: {}",
        game.current_score(),
        game.artists_found_count(),
        game.total_artists_count(),
        game.title_revealed().unwrap_or("?")
    );
}

fn print_feedback(game: &GameController, awarded: f64) {
    if awarded > 0.0 {
        println!("{}", format!("+{:.2} points", awarded).green());
    } else {
        println!("{}", "No match".red());
    }
    print_status(game);
}

fn reveal(game: &GameController) {
    if let Some(track) = game.current_track() {
        println!(
            "It was {} by {}",
            track.title.bold(),
            track.artists_label().bold()
        );
    }
}

fn print_summary(summary: &GameSummary) {
    println!();
    println!("{}", "=".repeat(60));
    println!("{}", "GAME SUMMARY".bold());
    println!("{}", "=".repeat(60));
    println!("Source: {}", summary.source);
    println!("Tracks played: {}", summary.rounds_played);
    println!(
        "Completed: {}",
        summary.rounds_completed.to_string().green()
    );
    println!("Skipped: {}", summary.rounds_skipped.to_string().red());
    println!("Titles found: {}", summary.titles_found);
    println!("Final score: {}", format!("{:.2}", summary.score).bold());
    println!(
        "Duration: {}s",
        (summary.finished_at - summary.started_at).num_seconds()
    );
    println!("{}", "=".repeat(60));

    if summary.rounds.is_empty() {
        return;
    }

    println!("\nTrack breakdown:");
    for round in &summary.rounds {
        let points = if !round.completed {
            format!("{:.2}", round.points).red()
        } else {
            format!("{:.2}", round.points).green()
        };

        println!(
            "  {} by {}: {}/{} artists, title {} ({})",
            round.title,
            round.artists.join(", "),
            round.artists_found,
            round.total_artists,
            if round.title_found { "found" } else { "missed" },
            points
        );
    }
}

async fn list_playlists() -> Result<()> {
    println!("{}", "Your Spotify Playlists".cyan().bold());
    println!("{}", "=".repeat(50));

    let config = Config::from_env().context("Failed to load configuration")?;

    if !config.validate_spotify_config() {
        println!("{}", "Missing Spotify configuration".red());
        std::process::exit(1);
    }

    let spotify_client = SpotifyClient::new(&config)
        .await
        .context("Failed to connect to Spotify")?;

    let playlists = spotify_client
        .user_playlists()
        .await
        .context("Failed to fetch playlists")?;

    if playlists.is_empty() {
        println!("{}", "No playlists found".yellow());
        return Ok(());
    }

    for (i, playlist) in playlists.iter().enumerate() {
        let name = if playlist.owned {
            playlist.name.green()
        } else {
            playlist.name.normal()
        };
        println!(
            "{:2}. {} ({} tracks) by {}",
            i + 1,
            name,
            playlist.total_tracks,
            playlist.owner
        );
        println!("     spotify:playlist:{}", playlist.id.cyan());
    }

    println!("\n{}", format!("Total: {} playlists", playlists.len()).cyan());

    Ok(())
}

fn show_setup_guide() {
    println!("{}", "Spotify Blind Test Setup Guide".cyan().bold());
    println!("{}", "=".repeat(50));

    println!("\n{}", "1. Spotify API Setup".yellow());
    println!("   - Go to https://developer.spotify.com/dashboard/");
    println!("   - Create a new app");
    println!("   - Copy your Client ID and Client Secret");
    println!("   - Add 'http://127.0.0.1:8080/callback' as a redirect URI");

    println!("\n{}", "2. Configuration".yellow());
    println!("   - Create a .env file with:");
    println!("     SPOTIFY_CLIENT_ID=your_spotify_client_id");
    println!("     SPOTIFY_CLIENT_SECRET=your_spotify_client_secret");
    println!("     SPOTIFY_REDIRECT_URI=http://127.0.0.1:8080/callback");
    println!("   - Or, with a token you already have:");
    println!("     SPOTIFY_ACCESS_TOKEN=your_bearer_token");
    println!("   - Optional scoring tweaks:");
    println!("     BLINDTEST_TITLE_THRESHOLD=80   (title similarity needed, in %)");
    println!("     BLINDTEST_TITLE_BONUS=100      (points for the title)");

    println!("\n{}", "3. Usage".yellow());
    println!("   - blindtest list-playlists                 (to see your playlists)");
    println!("   - blindtest play                           (to play on your saved tracks)");
    println!("   - blindtest play --playlist <URL or ID>    (to play on a playlist)");
    println!("   - blindtest play --seed 42 --max-tracks 10 (to replay a fixed set)");

    println!("\n{}", "Ready to play!".green());
}
