//! Build a bundle for a synthetic 120-episode run and print its summary and JSON export

use episode_flux::{records_to_bundle, BundleEncoder, MetricsRecordSet, RunSummary};

fn main() {
    let episodes = 120;
    let mut records = MetricsRecordSet::with_episodes(episodes);

    let mut goals = 0.0;
    let mut cumulative = Vec::with_capacity(episodes);
    let mut reward = Vec::with_capacity(episodes);
    let mut loss = Vec::with_capacity(episodes);
    for i in 0..episodes {
        // Goals start arriving after episode 40, every third episode.
        if i >= 40 && i % 3 == 0 {
            goals += 1.0;
        }
        cumulative.push(Some(goals));
        reward.push(Some(-50.0 + i as f64 * 0.8));
        // Every tenth loss sample is lost in logging.
        loss.push((i % 10 != 9).then(|| 1.0 / (1.0 + i as f64)));
    }
    let success: Vec<_> = cumulative
        .iter()
        .enumerate()
        .map(|(i, g)| g.map(|g| g / (i + 1) as f64))
        .collect();

    records.cumulative_goals = Some(cumulative);
    records.reward = Some(reward);
    records.training_loss = Some(loss);
    records.success_rate = Some(success);

    let bundle = records_to_bundle(&records);
    println!("{}\n", RunSummary::from_bundle(&bundle).to_text());

    match BundleEncoder::encode_to_json(&bundle) {
        Ok(json) => print!("{json}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
