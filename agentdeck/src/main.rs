//! Entry point for the agentdeck TUI. Parses args, resolves the feed profile and runs the App.

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use agentdeck::app::App;
use agentdeck::feed::Feed;
use agentdeck::profiles::{
    load_profiles, save_profiles, state_dir, ProfileEntry, ProfileRequest, ResolveProfile,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_REFRESH_SECS: u64 = 2;
const DEMO_SOURCE: &str = "demo";

#[derive(Debug, Default)]
struct ParsedArgs {
    file: Option<String>,
    profile: Option<String>,
    refresh: Option<u64>,
    save: bool,
    demo: bool,
    dry_run: bool,
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--file PATH|-f PATH] [--profile NAME|-P NAME] [--refresh SECS|-r SECS] [--save] [--demo] [--dry-run]"
    )
}

fn parse_refresh(v: &str, prog: &str) -> Result<u64, String> {
    v.parse::<u64>()
        .map_err(|_| format!("Invalid refresh interval '{v}'. {}", usage(prog)))
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "agentdeck".into());
    let mut parsed = ParsedArgs::default();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--file" | "-f" => parsed.file = it.next(),
            "--profile" | "-P" => parsed.profile = it.next(),
            "--refresh" | "-r" => {
                let v = it.next().unwrap_or_default();
                parsed.refresh = Some(parse_refresh(&v, &prog)?);
            }
            "--save" => parsed.save = true,
            "--demo" => parsed.demo = true,
            "--dry-run" => parsed.dry_run = true,
            _ if arg.starts_with("--file=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        parsed.file = Some(v.to_string());
                    }
                }
            }
            _ if arg.starts_with("--profile=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        parsed.profile = Some(v.to_string());
                    }
                }
            }
            _ if arg.starts_with("--refresh=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    parsed.refresh = Some(parse_refresh(v, &prog)?);
                }
            }
            _ => {
                // A bare positional is the snapshot path
                if parsed.file.is_none() {
                    parsed.file = Some(arg);
                } else {
                    return Err(format!("Unexpected argument. {}", usage(&prog)));
                }
            }
        }
    }
    Ok(parsed)
}

fn init_logging() {
    let dir = state_dir();
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("agentdeck.log"))
    else {
        return;
    };
    let filter = EnvFilter::try_from_env("AGENTDECK_LOG")
        .unwrap_or_else(|_| EnvFilter::new("agentdeck=info"));
    // The terminal owns stdout, so logs go to a file
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    init_logging();

    let Some(entry) = resolve_entry(&parsed)? else {
        return Ok(());
    };
    info!(source = %entry.source, refresh = ?entry.refresh_secs, "resolved feed");

    if parsed.dry_run {
        eprintln!("source: {}", entry.source);
        return Ok(());
    }

    let feed = if entry.source == DEMO_SOURCE {
        Feed::demo()
    } else {
        Feed::file(&entry.source)
    };
    let interval = Duration::from_secs(entry.refresh_secs.unwrap_or(DEFAULT_REFRESH_SECS).max(1));
    let mut app = App::new(feed, interval);
    app.run().await
}

// Demo short-circuits; otherwise profile resolution (and maybe persistence).
fn resolve_entry(parsed: &ParsedArgs) -> anyhow::Result<Option<ProfileEntry>> {
    if parsed.demo || matches!(parsed.profile.as_deref(), Some(DEMO_SOURCE)) {
        return Ok(Some(ProfileEntry {
            source: DEMO_SOURCE.into(),
            refresh_secs: parsed.refresh,
        }));
    }

    let profiles_file = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        source: parsed.file.clone(),
        refresh_secs: parsed.refresh,
    };
    let mut profiles_mut = profiles_file.clone();

    let entry = match req.resolve(&profiles_file) {
        ResolveProfile::Direct(entry) => {
            if let Some(name) = parsed.profile.as_ref() {
                match profiles_mut.profiles.get(name).cloned() {
                    None => {
                        // New profile: auto-save immediately
                        profiles_mut.profiles.insert(name.clone(), entry.clone());
                        persist(&profiles_mut);
                    }
                    Some(existing) if existing != entry => {
                        let overwrite = parsed.save
                            || prompt_yes_no(&format!(
                                "Overwrite existing profile '{name}'? [y/N]: "
                            ));
                        if overwrite {
                            profiles_mut.profiles.insert(name.clone(), entry.clone());
                            persist(&profiles_mut);
                        }
                    }
                    Some(_) => {}
                }
            }
            entry
        }
        ResolveProfile::Loaded(entry) => entry,
        ResolveProfile::PromptSelect(mut names) => {
            if !names.iter().any(|n| n == DEMO_SOURCE) {
                names.push(DEMO_SOURCE.into());
            }
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            let line = prompt_string("Enter number (or blank to abort): ")?;
            let Some(name) = line
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| idx.checked_sub(1))
                .and_then(|idx| names.get(idx))
            else {
                return Ok(None);
            };
            if name == DEMO_SOURCE {
                ProfileEntry {
                    source: DEMO_SOURCE.into(),
                    refresh_secs: parsed.refresh,
                }
            } else {
                match profiles_mut.profiles.get(name) {
                    Some(entry) => entry.clone(),
                    None => return Ok(None),
                }
            }
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let source = prompt_string("Enter snapshot path (or 'demo'): ")?;
            if source.trim().is_empty() {
                return Ok(None);
            }
            let entry = ProfileEntry {
                source: source.trim().to_string(),
                refresh_secs: parsed.refresh,
            };
            profiles_mut.profiles.insert(name, entry.clone());
            persist(&profiles_mut);
            entry
        }
        ResolveProfile::None => {
            eprintln!("No snapshot file provided and no profiles to select. Try --demo.");
            return Ok(None);
        }
    };
    Ok(Some(entry))
}

fn persist(profiles: &agentdeck::profiles::ProfilesFile) {
    if let Err(e) = save_profiles(profiles) {
        warn!(error = %e, "saving profiles failed");
        eprintln!("warning: could not save profiles: {e}");
    }
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_ok() {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
