use anyhow::{Context, Result};
use clap::Parser;
use segpath::{
    decode, utils::timer, DecodeInput, DecodeParams, Decoded, ModelSpec, SegmentModel,
};
use serde_json::json;

#[derive(Parser, Debug)]
struct Opts {
    /// model json (states, transitions and penalty functions)
    #[clap(long)]
    model: std::path::PathBuf,
    /// input json (emissions, positions and optional sequence/dictionary)
    #[clap(long)]
    input: std::path::PathBuf,
    /// params json. Command line flags override it.
    #[clap(long)]
    params: Option<std::path::PathBuf>,
    #[clap(short = 'n', long)]
    nbest: Option<usize>,
    #[clap(long)]
    parallel: bool,
    #[clap(long)]
    no_orf: bool,
    /// write the paths here instead of stdout
    #[clap(short = 'o', long)]
    output: Option<std::path::PathBuf>,
}

fn to_json(decoded: &Decoded, model: &SegmentModel, input: &DecodeInput) -> serde_json::Value {
    let paths: Vec<serde_json::Value> = decoded
        .paths
        .iter()
        .map(|path| {
            let states: Vec<&str> = path
                .state_seq
                .iter()
                .map(|&s| model.state(s).name.as_str())
                .collect();
            let decomposition = path.decomposition.as_ref().map(|d| {
                d.values
                    .outer_iter()
                    .map(|row| row.to_vec())
                    .collect::<Vec<_>>()
            });
            json!({
                "score": path.score,
                "states": states,
                "state_seq": path.state_seq,
                "pos_seq": path.pos_seq,
                "positions": path.positions(&input.positions),
                "decomposition": decomposition,
            })
        })
        .collect();
    json!({
        "penalties": decoded.penalty_names,
        "paths": paths,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let opts: Opts = Opts::parse();
    println!("# started_at={}", chrono::Local::now());
    println!("# opts={:?}", opts);

    let spec = ModelSpec::from_json_file(&opts.model)
        .with_context(|| format!("loading model {}", opts.model.display()))?;
    let model = SegmentModel::from_spec(spec);
    let input = DecodeInput::from_json_file(&opts.input)
        .with_context(|| format!("loading input {}", opts.input.display()))?;
    let mut params = match &opts.params {
        Some(path) => DecodeParams::from_json_file(path)
            .with_context(|| format!("loading params {}", path.display()))?,
        None => DecodeParams::default(),
    };
    if let Some(nbest) = opts.nbest {
        params.nbest = nbest;
    }
    params.parallel |= opts.parallel;
    params.use_orf &= !opts.no_orf;
    println!("# params={:?}", params);

    let (decoded, time) = timer(|| decode(&model, &input, &params));
    let decoded = decoded.context("decoding")?;
    println!(
        "# n_states={} seq_len={} n_paths={} time={}ms",
        model.n_states(),
        input.seq_len(),
        decoded.paths.len(),
        time
    );

    let output = to_json(&decoded, &model, &input);
    match &opts.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            serde_json::to_writer_pretty(file, &output)?;
        }
        None => println!("{}", serde_json::to_string_pretty(&output)?),
    }

    println!("# finished_at={}", chrono::Local::now());
    Ok(())
}
