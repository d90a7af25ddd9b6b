use std::collections::BTreeMap;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use imagine_contracts::chat::{command_help_lines, parse_intent, Intent};
use imagine_contracts::events::{EventKind, EventPayload, EventWriter};
use imagine_contracts::params::{ASPECT_RATIOS, STYLE_PRESETS};
use imagine_contracts::store::{HistoryStore, StateStore};
use imagine_contracts::templates::{TemplateMode, PROMPT_TEMPLATES};
use imagine_engine::feed::{FeedSession, FeedSpeed, FeedStatus};
use imagine_engine::loader::{LoaderState, ProgressiveLoader};
use imagine_engine::studio::{GenerationRun, RequestVariant, StudioEngine};
use imagine_engine::transfer::{
    copy_link, download_variant, fetch_image, save_image, share, FetchedImage, ShareOutcome,
};
use imagine_engine::{api_base, error_chain_text, feed_url, short_id, state_dir};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "imagine", version, about = "Terminal studio for the Pollinations image API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    /// Directory for state.json and events.jsonl.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive studio REPL (the default).
    Studio,
    /// One-shot generation.
    Generate(GenerateArgs),
    /// Headless live-feed watcher.
    Feed(FeedArgs),
    /// List or clear the persisted history.
    History(HistoryArgs),
    /// List the model registry.
    Models,
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    seed: Option<i64>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    ratio: Option<String>,
    #[arg(long)]
    style: Option<String>,
    #[arg(long)]
    variations: Option<u32>,
    /// A/B compare against a second model.
    #[arg(long)]
    ab: Option<String>,
    #[arg(long)]
    no_logo: Option<bool>,
    #[arg(long)]
    enhance: Option<bool>,
    #[arg(long)]
    safe: Option<bool>,
    #[arg(long)]
    steps: Option<u32>,
    #[arg(long)]
    strength: Option<f64>,
    /// Download every variant into this directory.
    #[arg(long)]
    download: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct FeedArgs {
    /// Stop after this many items have been shown.
    #[arg(long, default_value_t = 24)]
    limit: usize,
    #[arg(long, default_value = "normal")]
    speed: String,
}

#[derive(Debug, Parser)]
struct HistoryArgs {
    #[arg(long)]
    clear: bool,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("imagine error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let state_dir = state_dir(cli.state_dir.as_deref());
    match cli.command {
        None | Some(Command::Studio) => run_studio(&state_dir),
        Some(Command::Generate(args)) => run_generate(&state_dir, args),
        Some(Command::Feed(args)) => run_feed(&state_dir, args),
        Some(Command::History(args)) => run_history(&state_dir, args),
        Some(Command::Models) => run_models(&state_dir),
    }
}

struct Session {
    studio: StudioEngine,
    feed: FeedSession,
    events: EventWriter,
}

fn open_session(state_dir: &Path) -> Result<Session> {
    let events = EventWriter::new(state_dir.join("events.jsonl"), short_id());
    let history = HistoryStore::new(StateStore::open(state_dir.join("state.json")));
    let base = api_base();

    let mut payload = EventPayload::new();
    payload.insert(
        "state_dir".to_string(),
        Value::String(state_dir.display().to_string()),
    );
    events.emit(EventKind::SessionStarted, payload)?;

    let studio = StudioEngine::new(base.clone(), history, events.clone());
    let feed = FeedSession::new(feed_url(), base, events.clone());
    Ok(Session {
        studio,
        feed,
        events,
    })
}

fn run_studio(state_dir: &Path) -> Result<i32> {
    let mut session = open_session(state_dir)?;
    // The feed goes live with the studio; /feed off pauses it again.
    session.feed.set_enabled(true, Instant::now())?;
    let stdin = io::stdin();
    let mut line = String::new();

    println!("Imagine studio started. Type /help for commands, plain text to generate.");

    loop {
        session.feed.poll(Instant::now())?;

        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        let intent = parse_intent(input);
        if intent.action == "noop" {
            continue;
        }
        if intent.action == "quit" {
            break;
        }
        if let Err(err) = dispatch(&mut session, &intent) {
            println!("{}", error_chain_text(&err, 300));
        }
    }

    Ok(0)
}

fn dispatch(session: &mut Session, intent: &Intent) -> Result<()> {
    match intent.action.as_str() {
        "help" => {
            for summary in command_help_lines() {
                println!("{summary}");
            }
        }
        "status" => print_status(session),
        "generate" => {
            if let Some(prompt) = &intent.prompt {
                session.studio.set_prompt(prompt.clone());
            }
            generate_and_render(session)?;
        }
        "set_model" => {
            let requested = arg_text(intent, "model")
                .context("usage: /model <id> (see /models)")?;
            let selection = session.studio.set_model(&requested)?;
            if let Some(reason) = &selection.fallback_reason {
                println!("{reason}");
            }
            println!("Model set to {}", selection.model.id);
        }
        "list_models" => {
            for model in session.studio.registry().list() {
                println!("{:<18} {}", model.id, model.label);
            }
        }
        "set_seed" => {
            let raw = arg_text(intent, "seed").context("usage: /seed <n>")?;
            let seed: i64 = raw.parse().with_context(|| format!("invalid seed '{raw}'"))?;
            session.studio.set_seed(seed);
            println!("Seed set to {seed}");
        }
        "randomize_seed" => {
            let seed = session.studio.randomize_seed();
            println!("Seed randomized to {seed}");
        }
        "toggle_seed_lock" => {
            let locked = session.studio.toggle_seed_lock();
            println!("Seed lock {}", if locked { "on" } else { "off" });
        }
        "set_ratio" => {
            let id = arg_text(intent, "ratio").context("usage: /ratio <id> (see /ratios)")?;
            session.studio.set_ratio(&id)?;
            let draft = session.studio.draft();
            println!("Ratio {} ({}x{})", draft.ratio, draft.width, draft.height);
        }
        "list_ratios" => {
            for ratio in ASPECT_RATIOS {
                println!("{:<10} {:<5} {}x{}", ratio.id, ratio.label, ratio.width, ratio.height);
            }
        }
        "set_style" => {
            let raw = arg_text(intent, "style").context("usage: /style <id|off>")?;
            if raw.eq_ignore_ascii_case("off") {
                session.studio.set_style(None)?;
                println!("Style cleared");
            } else {
                session.studio.set_style(Some(&raw))?;
                println!("Style set to {raw}");
            }
        }
        "list_styles" => {
            for style in STYLE_PRESETS {
                println!("{:<12} {}", style.id, style.descriptor);
            }
        }
        "set_size" => {
            let raw = arg_text(intent, "size").context("usage: /size <WxH>")?;
            let (width, height) = parse_size(&raw)?;
            session.studio.set_size(width, height)?;
            println!("Size set to {width}x{height}");
        }
        "set_variations" => {
            let raw = arg_text(intent, "count").context("usage: /variations <1..4>")?;
            let count: u32 = raw
                .parse()
                .with_context(|| format!("invalid variation count '{raw}'"))?;
            let clamped = session.studio.set_variations(count);
            println!("Variations set to {clamped}");
        }
        "set_compare_model" => {
            let raw = arg_text(intent, "model").context("usage: /ab <model|off>")?;
            if raw.eq_ignore_ascii_case("off") {
                session.studio.set_compare_model(None)?;
                println!("A/B compare off");
            } else {
                session.studio.set_compare_model(Some(&raw))?;
                println!("A/B compare against {raw}");
            }
        }
        "set_toggle" => {
            let name = arg_text(intent, "name").unwrap_or_default();
            let Some(state) = intent.settings_update.get(&name).and_then(Value::as_bool) else {
                bail!("usage: /{name} on|off");
            };
            session.studio.set_toggle(&name, state)?;
            println!("{name} {}", if state { "on" } else { "off" });
        }
        "set_steps" => {
            let raw = arg_text(intent, "steps").context("usage: /steps <n|off>")?;
            if raw.eq_ignore_ascii_case("off") {
                session.studio.set_steps(None);
                println!("Steps cleared");
            } else {
                let steps: u32 = raw
                    .parse()
                    .with_context(|| format!("invalid steps '{raw}'"))?;
                session.studio.set_steps(Some(steps));
                println!("Steps set to {steps}");
            }
        }
        "set_strength" => {
            let raw = arg_text(intent, "strength").context("usage: /strength <x|off>")?;
            if raw.eq_ignore_ascii_case("off") {
                session.studio.set_strength(None);
                println!("Strength cleared");
            } else {
                let strength: f64 = raw
                    .parse()
                    .with_context(|| format!("invalid strength '{raw}'"))?;
                session.studio.set_strength(Some(strength));
                println!("Strength set to {strength}");
            }
        }
        "download" => {
            let variant = resolve_variant(&session.studio, arg_text(intent, "label").as_deref())?;
            let dir = arg_text(intent, "dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("downloads"));
            let url = variant.url.clone();
            let label = variant.label.clone();
            let path = download_variant(&session.events, &url, &dir, &label)?;
            println!("Saved {}", path.display());
        }
        "copy_link" => {
            let variant = resolve_variant(&session.studio, arg_text(intent, "label").as_deref())?;
            let url = variant.url.clone();
            copy_link(&session.events, &url)?;
            println!("Link copied to clipboard");
        }
        "share" => {
            let variant = resolve_variant(&session.studio, arg_text(intent, "label").as_deref())?;
            let url = variant.url.clone();
            println!("{url}");
            match share(&session.events, &url)? {
                ShareOutcome::CopiedLink => println!("Share link copied to clipboard"),
                ShareOutcome::Printed => println!("Clipboard unavailable; link printed above"),
            }
        }
        "list_history" => print_history(&session.studio),
        "remix" => {
            let raw = arg_text(intent, "index").context("usage: /remix <n> (see /history)")?;
            let index: usize = raw
                .parse()
                .with_context(|| format!("invalid history index '{raw}'"))?;
            session.studio.remix(index)?;
            println!("Draft loaded from history entry {index} (seed locked)");
        }
        "clear_history" => {
            session.studio.clear_history()?;
            println!("History cleared");
        }
        "use_prompt" => {
            let raw = arg_text(intent, "index").context("usage: /use <n> (see /feed)")?;
            let index: usize = raw
                .parse()
                .with_context(|| format!("invalid feed index '{raw}'"))?;
            let Some(item) = session.feed.visible_page().get(index) else {
                bail!("no feed item at index {index} on this page");
            };
            let Some(prompt) = item.prompt.clone() else {
                bail!("feed item {index} carries no prompt");
            };
            session.studio.use_prompt(prompt.clone());
            println!("Draft prompt set to: {prompt}");
        }
        "apply_template" => {
            let id = arg_text(intent, "id")
                .context("usage: /template <id> field=value ... [append]")?;
            let mode = match arg_text(intent, "mode").as_deref() {
                Some("append") => TemplateMode::Append,
                _ => TemplateMode::Replace,
            };
            let values: BTreeMap<String, String> = intent
                .command_args
                .get("values")
                .and_then(Value::as_object)
                .map(|map| {
                    map.iter()
                        .filter_map(|(key, value)| {
                            value.as_str().map(|text| (key.clone(), text.to_string()))
                        })
                        .collect()
                })
                .unwrap_or_default();
            let prompt = session.studio.apply_template(&id, &values, mode)?;
            println!("Draft prompt set to: {prompt}");
        }
        "list_templates" => {
            for template in PROMPT_TEMPLATES {
                println!("{:<10} {}", template.id, template.pattern);
            }
        }
        "feed_status" => {
            let status = session.feed.poll(Instant::now())?;
            print_feed(session, &status);
        }
        "set_feed" => {
            let Some(enabled) = intent
                .settings_update
                .get("feed_enabled")
                .and_then(Value::as_bool)
            else {
                bail!("usage: /feed [on|off]");
            };
            session.feed.set_enabled(enabled, Instant::now())?;
            println!("Feed {}", if enabled { "resumed" } else { "paused" });
        }
        "page_older" => {
            if session.feed.page_older() {
                let status = session.feed.status();
                print_feed(session, &status);
            } else {
                println!("No older feed items");
            }
        }
        "page_newer" => {
            if session.feed.page_newer() {
                let status = session.feed.status();
                print_feed(session, &status);
            } else {
                println!("Already at the newest page");
            }
        }
        "set_speed" => {
            let Some(speed) = intent
                .settings_update
                .get("feed_speed")
                .and_then(Value::as_str)
            else {
                bail!("usage: /speed slow|normal");
            };
            let speed = if speed == "slow" {
                FeedSpeed::Slow
            } else {
                FeedSpeed::Normal
            };
            session.feed.set_speed(speed);
            println!("Feed speed {}", speed.as_str());
        }
        "unknown" => {
            let command = arg_text(intent, "command").unwrap_or_default();
            println!("Unknown command /{command}; try /help");
        }
        other => bail!("unhandled intent action '{other}'"),
    }
    Ok(())
}

fn generate_and_render(session: &mut Session) -> Result<()> {
    let run = session.studio.generate(None)?;
    print_variants(run);
    let primary_url = run.primary().url.clone();
    match fetch_with_progress(&primary_url) {
        Ok(fetched) => println!(
            "Primary variant: {}x{}, {} bytes",
            fetched.width,
            fetched.height,
            fetched.bytes.len()
        ),
        Err(err) => println!("Primary fetch failed: {}", error_chain_text(&err, 300)),
    }
    Ok(())
}

/// Drives the progressive loader against one real fetch and renders a
/// single-line meter. The loader is cosmetic; the fetch runs regardless.
fn fetch_with_progress(url: &str) -> Result<FetchedImage> {
    let (tx, rx) = std::sync::mpsc::channel();
    let fetch_url = url.to_string();
    thread::spawn(move || {
        let _ = tx.send(fetch_image(&fetch_url));
    });

    let mut loader = ProgressiveLoader::new();
    loader.begin(url);
    let mut outcome: Option<Result<FetchedImage>> = None;

    loop {
        let now = Instant::now();
        if outcome.is_none() {
            match rx.try_recv() {
                Ok(result) => {
                    match &result {
                        Ok(_) => loader.succeed(now),
                        Err(_) => loader.fail(),
                    }
                    outcome = Some(result);
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => {}
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    loader.fail();
                    outcome = Some(Err(anyhow::anyhow!("fetch worker exited")));
                }
            }
        }
        loader.tick(now);
        render_progress(loader.progress());

        match loader.state() {
            LoaderState::Loaded | LoaderState::Failed => break,
            _ => thread::sleep(Duration::from_millis(40)),
        }
    }
    println!();

    outcome.unwrap_or_else(|| Err(anyhow::anyhow!("fetch produced no outcome")))
}

fn render_progress(progress: f64) {
    let filled = (progress / 5.0).round() as usize;
    let bar: String = (0..20)
        .map(|index| if index < filled { '#' } else { '-' })
        .collect();
    print!("\r[{bar}] {progress:5.1}%");
    let _ = io::stdout().flush();
}

fn print_variants(run: &GenerationRun) {
    println!("Run {} ({} variant{})", run.id, run.variants.len(), plural(run.variants.len()));
    for variant in &run.variants {
        println!("  {:<8} {:<16} seed {:<6} {}", variant.label, variant.model, variant.seed, variant.url);
    }
}

fn print_status(session: &Session) {
    let draft = session.studio.draft();
    println!("Prompt: {}", draft.prompt);
    println!(
        "Model: {}  Seed: {}{}  Size: {}x{} ({})",
        draft.model,
        draft.seed,
        if draft.seed_locked { " [locked]" } else { "" },
        draft.width,
        draft.height,
        draft.ratio
    );
    println!(
        "Style: {}  Variations: {}  A/B: {}",
        draft.style.as_deref().unwrap_or("none"),
        draft.variations,
        draft.compare_model.as_deref().unwrap_or("off")
    );
    println!(
        "nologo {}  enhance {}  safe {}  steps {}  strength {}",
        on_off(draft.nologo),
        on_off(draft.enhance),
        on_off(draft.safe),
        draft
            .steps
            .map(|value| value.to_string())
            .unwrap_or_else(|| "off".to_string()),
        draft
            .strength
            .map(|value| value.to_string())
            .unwrap_or_else(|| "off".to_string()),
    );
    let status = session.feed.status();
    println!(
        "Feed: {} ({} visible, {} buffered, page {}, {})",
        feed_state_text(&status),
        status.visible,
        status.pending,
        status.page_index,
        status.speed.as_str()
    );
    match session.studio.applied() {
        Some(run) => println!("Applied run: {} ({})", run.id, run.primary().url),
        None => println!("Applied run: none"),
    }
}

fn print_history(studio: &StudioEngine) {
    if studio.history().is_empty() {
        println!("History is empty");
        return;
    }
    for (index, entry) in studio.history().entries().iter().enumerate() {
        println!(
            "{index:>3}  {}  {:<16} seed {:<6} {}",
            entry.created_at,
            entry.parameters.model,
            entry.parameters.seed,
            imagine_engine::truncate_text(&entry.parameters.prompt, 60)
        );
    }
}

fn print_feed(session: &Session, status: &FeedStatus) {
    if let Some(error) = &status.error {
        println!("Feed unavailable: {error}");
        return;
    }
    let page = session.feed.visible_page();
    if page.is_empty() {
        println!("Waiting for new creations...");
        return;
    }
    println!(
        "Feed page {} ({}; {} visible, {} buffered)",
        status.page_index,
        feed_state_text(status),
        status.visible,
        status.pending
    );
    for (index, item) in page.iter().enumerate() {
        let prompt = item.prompt.as_deref().unwrap_or("(no prompt)");
        println!("{index:>3}  {}", imagine_engine::truncate_text(prompt, 70));
        println!("     {}", item.url);
    }
}

fn feed_state_text(status: &FeedStatus) -> &'static str {
    if status.enabled {
        if status.connected {
            "live"
        } else {
            "connecting"
        }
    } else if status.auto_paused {
        "auto-paused"
    } else {
        "paused"
    }
}

fn run_generate(state_dir: &Path, args: GenerateArgs) -> Result<i32> {
    let mut session = open_session(state_dir)?;
    let studio = &mut session.studio;

    studio.set_prompt(args.prompt);
    if let Some(model) = &args.model {
        let selection = studio.set_model(model)?;
        if let Some(reason) = &selection.fallback_reason {
            println!("{reason}");
        }
    }
    if let Some(ratio) = &args.ratio {
        studio.set_ratio(ratio)?;
    }
    if let (Some(width), Some(height)) = (args.width, args.height) {
        studio.set_size(width, height)?;
    }
    if let Some(seed) = args.seed {
        studio.set_seed(seed);
        studio.set_seed_locked(true);
    }
    if let Some(style) = &args.style {
        studio.set_style(Some(style))?;
    }
    if let Some(count) = args.variations {
        studio.set_variations(count);
    }
    if let Some(model) = &args.ab {
        studio.set_compare_model(Some(model))?;
    }
    if let Some(state) = args.no_logo {
        studio.set_toggle("nologo", state)?;
    }
    if let Some(state) = args.enhance {
        studio.set_toggle("enhance", state)?;
    }
    if let Some(state) = args.safe {
        studio.set_toggle("safe", state)?;
    }
    studio.set_steps(args.steps);
    studio.set_strength(args.strength);

    let run = studio.generate(None)?.clone();
    print_variants(&run);

    match fetch_with_progress(&run.primary().url) {
        Ok(fetched) => {
            println!(
                "Primary variant: {}x{}, {} bytes",
                fetched.width,
                fetched.height,
                fetched.bytes.len()
            );
            if let Some(dir) = &args.download {
                let path = save_image(&session.events, &fetched, dir, &run.primary().label)?;
                println!("Saved {}", path.display());
                for variant in run.variants.iter().skip(1) {
                    let path =
                        download_variant(&session.events, &variant.url, dir, &variant.label)?;
                    println!("Saved {}", path.display());
                }
            }
        }
        Err(err) => {
            println!("Primary fetch failed: {}", error_chain_text(&err, 300));
            if args.download.is_some() {
                return Ok(1);
            }
        }
    }
    Ok(0)
}

fn run_feed(state_dir: &Path, args: FeedArgs) -> Result<i32> {
    let mut session = open_session(state_dir)?;
    let speed = match args.speed.as_str() {
        "slow" => FeedSpeed::Slow,
        _ => FeedSpeed::Normal,
    };
    session.feed.set_speed(speed);
    session.feed.set_enabled(true, Instant::now())?;

    println!("Watching the live feed (limit {})...", args.limit);
    let mut shown: Vec<String> = Vec::new();
    let mut last_error: Option<String> = None;
    loop {
        let status = session.feed.poll(Instant::now())?;
        if let Some(error) = feed_error_transition(&mut last_error, status.error.as_deref()) {
            println!("Feed unavailable: {error}");
        }
        for item in session.feed.visible_page() {
            if shown.contains(&item.url) {
                continue;
            }
            shown.push(item.url.clone());
            let prompt = item.prompt.as_deref().unwrap_or("(no prompt)");
            println!("{:>3}  {}", shown.len(), imagine_engine::truncate_text(prompt, 70));
            println!("     {}", item.url);
            if shown.len() >= args.limit {
                return Ok(0);
            }
        }
        thread::sleep(Duration::from_millis(250));
    }
}

/// A persistent outage prints once, not on every poll: only a new or
/// changed error is reported, and recovery re-arms the report.
fn feed_error_transition(last: &mut Option<String>, current: Option<&str>) -> Option<String> {
    match current {
        Some(error) if last.as_deref() != Some(error) => {
            *last = Some(error.to_string());
            Some(error.to_string())
        }
        Some(_) => None,
        None => {
            *last = None;
            None
        }
    }
}

fn run_history(state_dir: &Path, args: HistoryArgs) -> Result<i32> {
    let mut session = open_session(state_dir)?;
    if args.clear {
        session.studio.clear_history()?;
        println!("History cleared");
        return Ok(0);
    }
    print_history(&session.studio);
    Ok(0)
}

fn run_models(state_dir: &Path) -> Result<i32> {
    let session = open_session(state_dir)?;
    for model in session.studio.registry().list() {
        println!("{:<18} {}", model.id, model.label);
    }
    Ok(0)
}

fn arg_text(intent: &Intent, key: &str) -> Option<String> {
    intent
        .command_args
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_size(raw: &str) -> Result<(u32, u32)> {
    let Some((width, height)) = raw.split_once(['x', 'X']) else {
        bail!("expected <WxH>, got '{raw}'");
    };
    let width: u32 = width
        .trim()
        .parse()
        .with_context(|| format!("invalid width '{width}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .with_context(|| format!("invalid height '{height}'"))?;
    Ok((width, height))
}

fn resolve_variant<'a>(studio: &'a StudioEngine, label: Option<&str>) -> Result<&'a RequestVariant> {
    let Some(run) = studio.applied() else {
        bail!("nothing generated yet; run /generate first");
    };
    match label {
        None => Ok(run.primary()),
        Some(label) => run
            .variant_by_label(label)
            .with_context(|| format!("no variant labeled '{label}' in the applied run")),
    }
}

fn on_off(state: bool) -> &'static str {
    if state {
        "on"
    } else {
        "off"
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::{feed_error_transition, parse_size};

    #[test]
    fn parse_size_accepts_both_separators() {
        assert_eq!(parse_size("1024x768").unwrap(), (1024, 768));
        assert_eq!(parse_size("1344X768").unwrap(), (1344, 768));
    }

    #[test]
    fn parse_size_rejects_garbage() {
        assert!(parse_size("1024").is_err());
        assert!(parse_size("wx7").is_err());
    }

    #[test]
    fn persistent_feed_error_reports_once() {
        let mut last = None;
        assert_eq!(
            feed_error_transition(&mut last, Some("connect refused")),
            Some("connect refused".to_string())
        );
        assert_eq!(feed_error_transition(&mut last, Some("connect refused")), None);
        assert_eq!(feed_error_transition(&mut last, Some("connect refused")), None);
        assert_eq!(
            feed_error_transition(&mut last, Some("stream ended")),
            Some("stream ended".to_string())
        );
        assert_eq!(feed_error_transition(&mut last, None), None);
        assert_eq!(
            feed_error_transition(&mut last, Some("connect refused")),
            Some("connect refused".to_string())
        );
    }
}
