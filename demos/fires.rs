use mixclust::{
    classify_columns, cluster_sizes, crosstab_normalized, DendrogramRequest, FeatureKind,
    Pipeline, PipelineConfig, Table, Value,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fire-spot records from three regions with their own year ranges.
fn synthetic_fires(n_per_region: usize, seed: u64) -> mixclust::Result<Table> {
    let regions = [
        ("PA", (-3.5, -52.0), 2015..2021i32),
        ("AM", (-4.0, -63.0), 1999..2005),
        ("MT", (-13.0, -56.0), 2005..2012),
    ];
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(3 * n_per_region);
    for (state, (lat, lon), years) in &regions {
        for _ in 0..n_per_region {
            let year = rng.random_range(years.clone());
            let month = rng.random_range(6..=11i32);
            let firespots = if rng.random_bool(0.05) {
                Value::Missing
            } else {
                Value::from(rng.random_range(50..5_000i32))
            };
            rows.push(vec![
                Value::from(year),
                Value::from(month),
                Value::from(*state),
                Value::from(*lat + rng.random_range(-1.5..1.5f64)),
                Value::from(*lon + rng.random_range(-1.5..1.5f64)),
                firespots,
            ]);
        }
    }
    let columns = ["year", "month", "state", "latitude", "longitude", "firespots"]
        .map(String::from)
        .to_vec();
    Table::new(columns, rows)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mixclust=info".into()),
        )
        .init();

    let fires = synthetic_fires(20, 7)?;
    let mut table = fires.clone();
    let kinds = classify_columns(&table);
    for (name, kind) in table.columns().iter().zip(&kinds) {
        let tag = match kind {
            FeatureKind::Numeric => "numeric",
            FeatureKind::Categorical => "categorical",
        };
        println!("{name:>10}: {tag}");
    }

    let config = PipelineConfig::default()
        .with_cluster_counts([3, 4])
        .with_dendrogram(DendrogramRequest::new(0.53).with_depth(6))
        .with_dendrogram(DendrogramRequest::new(0.50).with_depth(6));
    let pipeline = Pipeline::new(config);
    let out = pipeline.run_configured(&table, &kinds)?;

    println!("\nlinkage (id1, id2, dist, n), last 5 merges:");
    let rows = out.run.linkage().to_rows();
    for row in rows.iter().rev().take(5).rev() {
        println!(
            "  {:>4} {:>4} {:.4} {:>4}",
            row[0], row[1], row[2], row[3]
        );
    }

    for (labels, tree) in out.labelings.iter().zip(&out.dendrograms) {
        let k = labels.k();
        println!("\n{k} groups (color threshold {}):", tree.threshold);
        println!("{tree}");
        println!("leaves: {:?}", tree.labels());

        for (label, size) in cluster_sizes(labels) {
            println!("  group {label}: {size} records");
        }
        labels.append_to(&mut table, format!("grupo_{k}"))?;
    }

    let years: Vec<Value> = table.column(0).cloned().collect();
    println!("\nyear by group (3 groups):");
    print!("{}", crosstab_normalized(&years, &out.labelings[0])?);

    // same input again: served from the cache
    pipeline.run(&fires, &kinds)?;
    println!("\ncache: {:?}", pipeline.cache().stats());
    Ok(())
}
