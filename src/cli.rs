use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use mentor_ledger::config::{Config, CONFIG_DIR};
use mentor_ledger::journal::Journal;
use mentor_ledger::mentors::{Availability, MentorProfileStore};
use mentor_ledger::models::{MentorProfile, MentorRank};
use mentor_ledger::reactions::{ReactionInput, ReactionLedger, REACTION_TAGS};
use mentor_ledger::stats::{self, Catalog};
use mentor_ledger::{fixtures, LikeLedger};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::path::PathBuf;

pub struct Context {
    pub config: Config,
    pub run_id: String,
    pub likes: RefCell<LikeLedger>,
    pub reactions: RefCell<ReactionLedger>,
    pub mentors: RefCell<MentorProfileStore>,
    pub journal: RefCell<Option<Journal>>,
}

impl Context {
    /// Record a mutation if a journal is open; journal failures only warn
    fn journal(&self, f: impl FnOnce(&mut Journal) -> Result<()>) {
        if let Some(journal) = self.journal.borrow_mut().as_mut() {
            if let Err(e) = f(journal) {
                tracing::warn!(error = %e, "failed to write journal entry");
            }
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Article likes (persisted)
    #[command(subcommand)]
    Likes(LikesCommand),
    /// Mentor profiles (in memory, seeded from fixtures)
    #[command(subcommand)]
    Mentors(MentorsCommand),
    /// Admin reactions to sessions (in memory)
    #[command(subcommand)]
    React(ReactCommand),
    /// Admin dashboard summary
    Stats {
        #[arg(long, help = "Print as JSON")]
        json: bool,
    },
    /// Interactive shell; ledgers stay loaded between commands
    Shell,
}

#[derive(Subcommand, Debug)]
pub enum LikesCommand {
    /// Flip a user's like on an article
    Toggle { article: String, user: String },
    /// Whether a user likes an article
    Status { article: String, user: String },
    /// Like count for an article
    Count { article: String },
    /// Users who liked an article
    Show { article: String },
    /// Likes across all articles
    Total,
    /// Most liked articles
    Top {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Drop every like on an article
    Clear { article: String },
}

#[derive(Subcommand, Debug)]
pub enum MentorsCommand {
    List {
        #[arg(long, help = "Only this rank (bronze|silver|gold|platinum)")]
        rank: Option<String>,
    },
    Show { id: String },
    Search { query: String },
    Top {
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    Stats { id: String },
    Export {
        #[arg(short, long, help = "Write to file instead of stdout")]
        output: Option<PathBuf>,
    },
    Import { path: PathBuf },
    AddSkill { id: String, skill: String },
    RemoveSkill { id: String, skill: String },
    /// Flip an availability flag (flash|long-term)
    Toggle { id: String, kind: String },
    Rate {
        id: String,
        rating: f64,
        #[arg(long)]
        reviews: Option<u32>,
    },
    Avatar { id: String, url: String },
}

#[derive(Subcommand, Debug)]
pub enum ReactCommand {
    Save {
        session: String,
        #[arg(long)]
        admin: String,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: String,
        #[arg(long)]
        recommendation: Option<String>,
        #[arg(long = "tag", help = "Repeatable")]
        tags: Vec<String>,
        #[arg(long, help = "Reject the save unless the stored version matches (0 = new)")]
        expect_version: Option<u64>,
    },
    Show { session: String },
    List {
        #[arg(long)]
        admin: Option<String>,
    },
    Stats,
    Delete { session: String },
    /// List the preset tag ids
    Tags,
}

/// A command line typed at the shell prompt
#[derive(Parser)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

pub fn run_once(ctx: &Context, command: Command) -> Result<()> {
    execute(ctx, command)
}

fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join("history"))
}

pub fn run_repl(ctx: &Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history = history_path();
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    println!("mentor-ledger - type /help for commands, /exit to quit");

    loop {
        match rl.readline("ledger> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                if line.starts_with('/') {
                    if handle_meta(ctx, line) {
                        break;
                    }
                    continue;
                }

                let words = match shell_words::split(line) {
                    Ok(words) => words,
                    Err(e) => {
                        eprintln!("Parse error: {}", e);
                        continue;
                    }
                };
                match ShellLine::try_parse_from(words) {
                    Ok(ShellLine {
                        command: Command::Shell,
                    }) => println!("Already in the shell"),
                    Ok(parsed) => {
                        if let Err(e) = execute(ctx, parsed.command) {
                            eprintln!("Error: {}", e);
                        }
                    }
                    Err(e) => {
                        let _ = e.print();
                    }
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    if let Some(path) = &history {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = rl.save_history(path) {
            tracing::debug!(error = %e, "could not save shell history");
        }
    }

    Ok(())
}

fn handle_meta(ctx: &Context, cmd: &str) -> bool {
    match cmd.split_whitespace().next().unwrap_or_default() {
        "/exit" | "/quit" => return true,
        "/help" => {
            println!("Meta commands:");
            println!("  /exit           - quit");
            println!("  /help           - show commands");
            println!("  /info           - show storage and run info");
            println!("Ledger commands (same as the CLI, e.g. `likes toggle 1 4`):");
            println!("  likes toggle|status|count|show|total|top|clear");
            println!("  mentors list|show|search|top|stats|export|import|add-skill|remove-skill|toggle|rate|avatar");
            println!("  react save|show|list|stats|delete|tags");
            println!("  stats [--json]");
            println!("Append --help to any command for its arguments.");
        }
        "/info" => {
            let cfg = &ctx.config;
            println!("Run: {}", ctx.run_id);
            println!("Storage backend: {}", cfg.storage.backend.as_str());
            if cfg.storage.backend == mentor_ledger::config::StorageBackend::File {
                println!("Data dir: {}", cfg.storage.data_dir().display());
            }
            println!("Likes key: {}", ctx.likes.borrow().storage_key());
            if let Some(journal) = ctx.journal.borrow().as_ref() {
                println!("Journal: {}", journal.path.display());
            }
        }
        other => println!("Unknown command: {}. Type /help", other),
    }
    false
}

fn execute(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Likes(cmd) => likes_command(ctx, cmd),
        Command::Mentors(cmd) => mentors_command(ctx, cmd),
        Command::React(cmd) => react_command(ctx, cmd),
        Command::Stats { json } => stats_command(ctx, json),
        Command::Shell => Err(anyhow!("The shell cannot be nested")),
    }
}

fn likes_command(ctx: &Context, cmd: LikesCommand) -> Result<()> {
    match cmd {
        LikesCommand::Toggle { article, user } => {
            let liked = ctx.likes.borrow_mut().toggle_like(&article, &user)?;
            ctx.journal(|j| j.like_toggled(&article, &user, liked));
            let count = ctx.likes.borrow().likes_count(&article);
            println!(
                "{} article {} ({} like(s))",
                if liked { "Liked" } else { "Unliked" },
                article,
                count
            );
        }
        LikesCommand::Status { article, user } => {
            let liked = ctx.likes.borrow().is_liked(&article, &user);
            println!("{}", if liked { "liked" } else { "not liked" });
        }
        LikesCommand::Count { article } => {
            println!("{}", ctx.likes.borrow().likes_count(&article));
        }
        LikesCommand::Show { article } => {
            let likes = ctx.likes.borrow();
            let likers = likes.likers(&article);
            if likers.is_empty() {
                println!("No likes on article {}", article);
            }
            for user in likers {
                println!("  {}", user);
            }
        }
        LikesCommand::Total => {
            println!("{}", ctx.likes.borrow().total_likes_count());
        }
        LikesCommand::Top { limit } => {
            let limit = limit.unwrap_or(ctx.config.likes.top_limit);
            for (rank, entry) in ctx
                .likes
                .borrow()
                .most_liked_articles(limit)
                .iter()
                .enumerate()
            {
                println!("{:>2}. article {:<12} {}", rank + 1, entry.article_id, entry.count);
            }
        }
        LikesCommand::Clear { article } => {
            if ctx.likes.borrow_mut().clear_article(&article)? {
                ctx.journal(|j| j.likes_cleared(&article));
                println!("Cleared likes on article {}", article);
            } else {
                println!("Article {} has no likes", article);
            }
        }
    }
    Ok(())
}

fn format_mentor(p: &MentorProfile) -> String {
    format!(
        "{:<4} {:<18} {:<9} rating {:.1} ({} reviews)  flash:{} long-term:{}  skills: {}",
        p.id,
        p.user.name,
        p.rank.as_str(),
        p.rating,
        p.review_count,
        if p.available_for_flash { "yes" } else { "no" },
        if p.available_for_long_term { "yes" } else { "no" },
        p.skills.join(", ")
    )
}

fn print_mentors(profiles: &[&MentorProfile]) {
    if profiles.is_empty() {
        println!("No mentors found");
    }
    for p in profiles {
        println!("{}", format_mentor(p));
    }
}

/// Report the outcome of a single-record mutator
fn mentor_mutation(ctx: &Context, id: &str, change: &str, ok: bool) -> Result<()> {
    ctx.journal(|j| j.mentor_updated(id, change, ok));
    if !ok {
        return Err(anyhow!("Mentor not found: {}", id));
    }
    if let Some(p) = ctx.mentors.borrow().get(id) {
        println!("{}", format_mentor(p));
    }
    Ok(())
}

fn mentors_command(ctx: &Context, cmd: MentorsCommand) -> Result<()> {
    match cmd {
        MentorsCommand::List { rank } => {
            let store = ctx.mentors.borrow();
            let profiles = match rank {
                Some(rank) => {
                    let rank = MentorRank::from_str(&rank).ok_or_else(|| {
                        anyhow!("Invalid rank: {}. Use: bronze, silver, gold, platinum", rank)
                    })?;
                    store.by_rank(rank)
                }
                None => store.all(),
            };
            print_mentors(&profiles);
        }
        MentorsCommand::Show { id } => {
            let store = ctx.mentors.borrow();
            let profile = store
                .get(&id)
                .ok_or_else(|| anyhow!("Mentor not found: {}", id))?;
            println!("{}", serde_json::to_string_pretty(profile)?);
        }
        MentorsCommand::Search { query } => {
            print_mentors(&ctx.mentors.borrow().search(&query));
        }
        MentorsCommand::Top { limit } => {
            print_mentors(&ctx.mentors.borrow().top_mentors(limit));
        }
        MentorsCommand::Stats { id } => {
            let stats = ctx
                .mentors
                .borrow()
                .mentor_stats(&id)
                .ok_or_else(|| anyhow!("Mentor not found: {}", id))?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        MentorsCommand::Export { output } => {
            let json = ctx.mentors.borrow().export_all()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!(
                        "Exported {} mentor(s) to {}",
                        ctx.mentors.borrow().len(),
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
        }
        MentorsCommand::Import { path } => {
            let content = std::fs::read_to_string(&path)?;
            let ok = ctx.mentors.borrow_mut().import_all(&content);
            let source = path.display().to_string();
            ctx.journal(|j| j.mentors_imported(&source, ok));
            if !ok {
                return Err(anyhow!("Import failed: {} is not a JSON array of mentor profiles", source));
            }
            println!("Imported; {} mentor(s) loaded", ctx.mentors.borrow().len());
        }
        MentorsCommand::AddSkill { id, skill } => {
            let ok = ctx.mentors.borrow_mut().add_skill(&id, &skill);
            mentor_mutation(ctx, &id, "add_skill", ok)?;
        }
        MentorsCommand::RemoveSkill { id, skill } => {
            let ok = ctx.mentors.borrow_mut().remove_skill(&id, &skill);
            mentor_mutation(ctx, &id, "remove_skill", ok)?;
        }
        MentorsCommand::Toggle { id, kind } => {
            let kind = Availability::from_str(&kind)
                .ok_or_else(|| anyhow!("Invalid availability: {}. Use: flash, long-term", kind))?;
            let ok = ctx.mentors.borrow_mut().toggle_availability(&id, kind);
            mentor_mutation(ctx, &id, "toggle_availability", ok)?;
        }
        MentorsCommand::Rate {
            id,
            rating,
            reviews,
        } => {
            if !(0.0..=5.0).contains(&rating) {
                return Err(anyhow!("Rating must be between 0 and 5, got {}", rating));
            }
            let ok = ctx.mentors.borrow_mut().update_rating(&id, rating, reviews);
            mentor_mutation(ctx, &id, "update_rating", ok)?;
        }
        MentorsCommand::Avatar { id, url } => {
            let ok = ctx.mentors.borrow_mut().update_avatar(&id, &url);
            mentor_mutation(ctx, &id, "update_avatar", ok)?;
        }
    }
    Ok(())
}

fn react_command(ctx: &Context, cmd: ReactCommand) -> Result<()> {
    match cmd {
        ReactCommand::Save {
            session,
            admin,
            rating,
            comment,
            recommendation,
            tags,
            expect_version,
        } => {
            let mut input = ReactionInput::new(&admin, rating, comment.trim());
            if let Some(rec) = recommendation.as_deref().map(str::trim) {
                if !rec.is_empty() {
                    input = input.with_recommendation(rec);
                }
            }
            for tag in &tags {
                if !REACTION_TAGS.contains(&tag.as_str()) {
                    tracing::warn!(tag = %tag, "tag is not one of the presets");
                }
                input = input.with_tag(tag);
            }
            input.validate()?;

            let reaction = match expect_version {
                Some(expected) => ctx
                    .reactions
                    .borrow_mut()
                    .save_reaction_checked(&session, input, expected)?,
                None => ctx.reactions.borrow_mut().save_reaction(&session, input),
            };
            ctx.journal(|j| j.reaction_saved(&session, &reaction.id, reaction.version));
            println!(
                "Saved {} for session {} (version {})",
                reaction.id, session, reaction.version
            );
        }
        ReactCommand::Show { session } => {
            let reactions = ctx.reactions.borrow();
            let reaction = reactions
                .reaction(&session)
                .ok_or_else(|| anyhow!("No reaction for session {}", session))?;
            println!("{}", serde_json::to_string_pretty(reaction)?);
        }
        ReactCommand::List { admin } => {
            let reactions = ctx.reactions.borrow();
            let list = match &admin {
                Some(admin) => reactions.reactions_by_admin(admin),
                None => reactions.all_reactions(),
            };
            if list.is_empty() {
                println!("No reactions");
            }
            for r in list {
                println!(
                    "session {:<6} admin {:<6} rating {}  tags [{}]  {}",
                    r.session_id,
                    r.admin_id,
                    r.rating,
                    r.tags.iter().cloned().collect::<Vec<_>>().join(", "),
                    r.comment
                );
            }
        }
        ReactCommand::Stats => {
            let stats = ctx.reactions.borrow().reaction_stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        ReactCommand::Delete { session } => {
            if ctx.reactions.borrow_mut().delete_reaction(&session) {
                ctx.journal(|j| j.reaction_deleted(&session));
                println!("Deleted reaction for session {}", session);
            } else {
                println!("No reaction for session {}", session);
            }
        }
        ReactCommand::Tags => {
            for tag in REACTION_TAGS {
                println!("  {}", tag);
            }
        }
    }
    Ok(())
}

fn stats_command(ctx: &Context, json: bool) -> Result<()> {
    let users = fixtures::users();
    let articles = fixtures::knowledge_articles();
    let sessions = fixtures::sessions();
    let catalog = Catalog {
        users: &users,
        articles: &articles,
        sessions: &sessions,
    };

    let likes = ctx.likes.borrow();
    let dashboard = stats::dashboard_stats(&catalog, &likes, chrono::Utc::now());
    let popular = stats::popular_articles(&catalog, &likes, ctx.config.likes.top_limit);
    let reactions = ctx.reactions.borrow().reaction_stats();

    if json {
        let out = serde_json::json!({
            "dashboard": dashboard,
            "popularArticles": popular,
            "reactions": reactions,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "Users:     {} ({} mentors, {} mentees, {} new this month)",
        dashboard.total_users,
        dashboard.total_mentors,
        dashboard.total_mentees,
        dashboard.new_users_this_month
    );
    println!(
        "Sessions:  {} ({} completed, {} active today)",
        dashboard.total_sessions, dashboard.completed_sessions, dashboard.active_sessions_today
    );
    println!(
        "Articles:  {} ({} likes, {} views)",
        dashboard.total_articles, dashboard.total_likes, dashboard.total_views
    );
    println!(
        "Reactions: {} (average rating {:.1})",
        reactions.total_reactions, reactions.average_rating
    );
    println!("\nPopular articles:");
    for article in &popular {
        println!(
            "  {:<4} {:>4} likes {:>5} views  {} ({})",
            article.id, article.likes, article.views, article.title, article.author
        );
    }
    Ok(())
}
