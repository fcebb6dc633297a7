use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use ev_sales_etl::analytics::{self, SummaryMetrics};
use ev_sales_etl::clean::CleanOptions;
use ev_sales_etl::dataset::Dataset;
use ev_sales_etl::filter::SelectionFilter;
use ev_sales_etl::pipeline::Pipeline;
use ev_sales_etl::schema::SynonymTable;

const MANUFACTURERS: [&str; 5] = ["Tata", "Mahindra", "MG", "Hyundai", "BYD"];
const SEGMENTS: [&str; 3] = ["SUV", "Sedan", "Hatchback"];

fn generate_sales(rows: usize) -> Dataset {
    let headers = [
        "Vehicle ID",
        "Brand",
        "Segment",
        "Battery",
        "Range",
        "Cost",
        "Revenue",
        "City",
        "Usage",
    ]
    .map(str::to_string);
    let records = (0..rows)
        .map(|i| {
            let gap = |value: String| if i % 7 == 0 { String::new() } else { value };
            vec![
                format!("V{i:06}"),
                MANUFACTURERS[i % MANUFACTURERS.len()].to_string(),
                SEGMENTS[i % SEGMENTS.len()].to_string(),
                gap(format!("{}", 20 + i % 60)),
                gap(format!("{}", 200 + i % 300)),
                format!("{}", 20_000 + (i % 50) * 500),
                gap(format!("{}", 900_000 + (i % 100) * 15_000)),
                gap((if i % 2 == 0 { "Pune" } else { "Delhi" }).to_string()),
                (if i % 3 == 0 { "Fleet" } else { "Personal" }).to_string(),
            ]
        })
        .collect::<Vec<_>>();
    Dataset::from_records(&headers, &records).expect("generated dataset")
}

fn bench_pipeline(c: &mut Criterion) {
    let synonyms = SynonymTable::builtin().expect("builtin synonyms");
    let pipeline = Pipeline::new(&synonyms, CleanOptions::default());
    let raw = generate_sales(20_000);

    c.bench_function("normalize_and_clean_20k", |b| {
        b.iter_batched(
            || raw.clone(),
            |dataset| pipeline.run(dataset).expect("pipeline"),
            BatchSize::LargeInput,
        )
    });

    let (cleaned, _) = pipeline.run(raw.clone()).expect("pipeline");
    let filter = SelectionFilter::from_values(&["SUV".to_string()], &[]);
    c.bench_function("filter_and_summarize_20k", |b| {
        b.iter(|| {
            let selected = filter.apply(&cleaned).expect("filter");
            let metrics = SummaryMetrics::compute(&selected);
            let breakdowns = analytics::standard_breakdowns(&selected, 10).expect("breakdowns");
            (metrics, breakdowns)
        })
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
