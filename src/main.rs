use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crown_oracle::analysis::archetype;
use crown_oracle::analysis::oracle::LinearScorer;
use crown_oracle::cache::CorpusCache;
use crown_oracle::config::Config;
use crown_oracle::context::AnalysisContext;
use crown_oracle::data::card_index::CardIndex;
use crown_oracle::data::catalog::{Card, CardCatalog};
use crown_oracle::data::corpus::{CorpusLoader, Deck, DECK_SIZE};
use crown_oracle::display::output::{
    display_card_win_rate, display_cards, display_classification, display_counter, display_deck,
    display_error, display_info, display_load_report, display_meta_pool, display_oracle,
    display_warning, display_win_rates,
};
use crown_oracle::error::AppError;
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

static CORPUS_CACHE: Lazy<CorpusCache> = Lazy::new(CorpusCache::new);

#[derive(Parser, Debug)]
#[command(name = "Crown Oracle")]
#[command(about = "Mine historical 1v1 matches for win rates, hard counters and counter decks", long_about = None)]
struct Args {
    /// Match corpus (CSV, no header)
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Card catalog (cards_i18n.json)
    #[arg(long, global = true)]
    cards: Option<PathBuf>,

    /// Oracle model weights (JSON)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Card id -> model index mapping (JSON)
    #[arg(long, global = true)]
    mapping: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List cards, optionally filtered by name
    Cards {
        query: Option<String>,
    },

    /// Global win rate of one card, or the best cards overall
    Winrate {
        card: Option<String>,

        /// Number of cards to list when no card is given
        #[arg(short, long, default_value = "20")]
        top: usize,

        /// Ignore cards seen in fewer matches than this
        #[arg(long, default_value = "100")]
        min_matches: u64,
    },

    /// Find the hard counter to a card you hate and a meta deck built around it
    Counter {
        card: String,
    },

    /// Pick the meta deck with the best predicted win probability against a deck
    Oracle {
        /// The opponent's 8 cards (names or ids)
        #[arg(required = true, num_args = 1..)]
        cards: Vec<String>,
    },

    /// Classify an 8-card deck into an archetype
    Archetype {
        #[arg(required = true, num_args = 1..)]
        cards: Vec<String>,
    },

    /// Show the most frequent winning decks
    Meta {
        #[arg(short, long, default_value = "10")]
        top: usize,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(path) = args.corpus {
        config.corpus_path = path;
    }
    if let Some(path) = args.cards {
        config.cards_path = path;
    }
    if let Some(path) = args.model {
        config.model_path = path;
    }
    if let Some(path) = args.mapping {
        config.mapping_path = path;
    }

    let catalog = CardCatalog::load(&config.cards_path)
        .with_context(|| format!("loading card catalog from {}", config.cards_path.display()))?;

    match args.command {
        Command::Cards { query } => {
            display_cards(&catalog.search(query.as_deref().unwrap_or("")));
        }
        Command::Archetype { cards } => {
            let deck = resolve_deck(&catalog, &cards)?;
            let ids: Vec<_> = deck.iter().map(|c| c.id).collect();
            let names: Vec<String> = deck.iter().map(|c| c.name.clone()).collect();
            display_deck("Deck", &ids, &names);
            display_classification(Some(&archetype::classify(&deck)?));
        }
        Command::Winrate {
            card,
            top,
            min_matches,
        } => {
            let context = build_context(&config, catalog)?;
            match card {
                Some(name) => {
                    let card = context.catalog().resolve(&name)?;
                    display_card_win_rate(card, &context.card_win_rate(card.id)?);
                }
                None => {
                    let rows: Vec<_> = context
                        .corpus()?
                        .aggregates
                        .win_rates
                        .top(top, min_matches)
                        .into_iter()
                        .map(|(id, record)| {
                            (id, record, context.catalog().name_or_unknown(id).to_string())
                        })
                        .collect();
                    display_win_rates(&rows);
                }
            }
        }
        Command::Counter { card } => {
            let context = build_context(&config, catalog)?;
            let hated = context.catalog().resolve(&card)?.clone();
            display_info(&format!(
                "Crunching win-rate deltas against {}...",
                hated.name
            ));

            let result = context.find_counter(hated.id)?;
            let counter_name = context.catalog().name_or_unknown(result.counter);
            display_counter(&hated.name, &result, counter_name);

            let deck = result.deck.cards();
            display_deck("Recommended Meta Deck", deck, &context.deck_names(deck));
            display_classification(context.classify(deck).ok().as_ref());
        }
        Command::Oracle { cards } => {
            let opponent = resolve_deck(&catalog, &cards)?;
            let mut deck: Deck = [0; DECK_SIZE];
            for (slot, card) in deck.iter_mut().zip(&opponent) {
                *slot = card.id;
            }

            let context = build_context(&config, catalog)?;
            display_info("Scoring the meta pool against the opponent deck...");
            let unmapped = context.unmapped_cards(&deck);
            if !unmapped.is_empty() {
                display_warning(&format!(
                    "Model has no entry for {}; scored with the default index",
                    context.deck_names(&unmapped).join(", ")
                ));
            }
            let best = context.rank_oracle(&deck)?;
            display_oracle(&best);

            let cards = best.deck.cards();
            display_deck("Oracle Counter", cards, &context.deck_names(cards));
            display_classification(context.classify(cards).ok().as_ref());
        }
        Command::Meta { top } => {
            let context = build_context(&config, catalog)?;
            let pool = context.corpus()?.aggregates.meta_pool.entries();
            display_meta_pool(&pool[..top.min(pool.len())], |entry| {
                let cards = entry.deck.cards();
                let archetype = context
                    .classify(cards)
                    .map(|c| c.archetype.to_string())
                    .unwrap_or_else(|_| "-".to_string());
                (archetype, context.deck_names(cards).join(", "))
            });
        }
    }

    Ok(())
}

/// Card arguments may be separate words or one comma-separated list.
fn resolve_deck<'a>(catalog: &'a CardCatalog, inputs: &[String]) -> Result<Vec<&'a Card>> {
    let names: Vec<&str> = inputs
        .iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let cards = catalog.resolve_deck(&names)?;
    if cards.len() != DECK_SIZE {
        return Err(AppError::InvalidDeckSize(cards.len()).into());
    }
    Ok(cards)
}

fn build_context(config: &Config, catalog: CardCatalog) -> Result<AnalysisContext> {
    let mut context = AnalysisContext::new(catalog);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Booting up the Anti-Meta Engine...");

    let started = Utc::now();
    let corpus = CORPUS_CACHE
        .get_or_load(&config.corpus_path, &CorpusLoader::default(), |rows| {
            pb.set_message(format!("Parsed {} rows", rows));
        })
        .with_context(|| format!("loading corpus from {}", config.corpus_path.display()))?;
    pb.finish_and_clear();

    match corpus {
        Some(corpus) => {
            let elapsed = (Utc::now() - started).num_milliseconds() as f64 / 1000.0;
            display_load_report(&corpus.report, elapsed);
            context = context.with_corpus(corpus);
        }
        None => display_warning(&format!(
            "Match corpus {} is missing; corpus-based engines are disabled",
            config.corpus_path.display()
        )),
    }

    if config.model_path.exists() && config.mapping_path.exists() {
        let scorer = LinearScorer::load(&config.model_path)?;
        let card_index = CardIndex::load(&config.mapping_path)?;
        context = context.with_oracle(Arc::new(scorer), card_index);
    }

    Ok(context)
}
