use crate::cli::{ConfigArgs, NormalizeArgs, PatternArgs, PayloadArgs, QueryArgs};
use anyhow::{anyhow, Context, Result};
use cpe_pattern::aggregate::{Aggregator, Payload};
use cpe_pattern::config::{self, PatternConfig};
use cpe_pattern::feed;
use cpe_pattern::normalize::{Normalizer, PassthroughNormalizer, PortageNormalizer};
use cpe_pattern::package::{group_atoms, parse_atom};
use cpe_pattern::quasi_cpe::RegexTranslator;
use cpe_pattern::util::read_payload;

pub fn run_pattern(args: PatternArgs, config: &PatternConfig) -> Result<()> {
    let pattern = build_pattern(&args.input, config)?;
    println!("{pattern}");
    Ok(())
}

pub fn run_query(args: QueryArgs, config: &PatternConfig) -> Result<()> {
    let feed_path = args
        .feed
        .as_deref()
        .or(config.feed_path.as_deref())
        .ok_or_else(|| anyhow!("no CPE match feed; pass --feed or set feed_path in the config"))?;
    let feed_path = feed::resolve_feed_path(feed_path);
    let pattern = build_pattern(&args.input, config)?;
    let matches = feed::search(&pattern, &feed_path)?;
    if args.json {
        let text = serde_json::to_string_pretty(&matches).context("serialize matches")?;
        println!("{text}");
    } else {
        for cpe in &matches {
            println!("{cpe}");
        }
    }
    Ok(())
}

pub fn run_normalize(args: NormalizeArgs, config: &PatternConfig) -> Result<()> {
    let payload = load_payload(&args.input)?;
    let normalizer = select_normalizer(&args.input, config);
    let records = payload
        .packages()
        .iter()
        .map(|package| normalizer.normalize(package))
        .collect::<Result<Vec<_>, _>>()?;
    let text = serde_json::to_string_pretty(&records).context("serialize canonical records")?;
    println!("{text}");
    Ok(())
}

pub fn run_config(args: ConfigArgs, config: &PatternConfig) -> Result<()> {
    if args.stub {
        println!("{}", config::config_stub());
        return Ok(());
    }
    let text = serde_json::to_string_pretty(config).context("serialize config")?;
    println!("{text}");
    Ok(())
}

fn build_pattern(input: &PayloadArgs, config: &PatternConfig) -> Result<String> {
    let payload = load_payload(input)?;
    let normalizer = select_normalizer(input, config);
    let aggregator = Aggregator::new(normalizer.as_ref(), &RegexTranslator);
    Ok(aggregator.run_payload(&payload)?)
}

fn select_normalizer(input: &PayloadArgs, config: &PatternConfig) -> Box<dyn Normalizer> {
    if input.canonical {
        Box::new(PassthroughNormalizer)
    } else {
        Box::new(PortageNormalizer::new(config))
    }
}

fn load_payload(input: &PayloadArgs) -> Result<Payload> {
    if !input.atoms.is_empty() {
        let packages = input
            .atoms
            .iter()
            .map(|atom| parse_atom(atom).ok_or_else(|| anyhow!("invalid package atom {atom:?}")))
            .collect::<Result<Vec<_>>>()?;
        let packages = group_atoms(packages)
            .iter()
            .map(|package| package.to_value())
            .collect();
        return Ok(Payload::Sequence(packages));
    }
    let text = read_payload(input.payload.clone())?;
    Ok(Payload::parse(&text)?)
}
