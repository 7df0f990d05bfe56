use criterion::{black_box, criterion_group, criterion_main, Criterion};
use open_meteo_etl::{
    Aggregation, EtlConfig, OpenMeteoEtl, OpenMeteoResponse, TransformPlan, UnitConversion,
};

const FIXTURE_JSON: &str = include_str!("../testdata/forecast_novosibirsk.json");

fn fixture_etl() -> OpenMeteoEtl {
    let averaged = [
        "temperature_2m_celsius",
        "relative_humidity_2m",
        "wind_speed_10m_m_per_s",
        "visibility_m",
    ];
    let plan = TransformPlan::builder()
        .conversions(vec![
            UnitConversion::fahrenheit_to_celsius(["temperature_2m"]),
            UnitConversion::knots_to_meters_per_second(["wind_speed_10m"]),
            UnitConversion::feet_to_meters(["visibility"]),
            UnitConversion::inches_to_millimeters(["snowfall"]),
        ])
        .aggregations(vec![
            Aggregation::average_over_full_day(averaged),
            Aggregation::total_over_full_day(["snowfall_mm"]),
            Aggregation::average_over_daylight(averaged),
            Aggregation::total_over_daylight(["snowfall_mm"]),
        ])
        .build();
    OpenMeteoEtl::builder()
        .config(EtlConfig::builder().plan(plan).build())
        .build()
}

fn bench_transform(c: &mut Criterion) {
    let etl = fixture_etl();
    let response = OpenMeteoResponse::from_json_str(FIXTURE_JSON).unwrap();

    c.bench_function("decode_fixture", |b| {
        b.iter(|| OpenMeteoResponse::from_json_str(black_box(FIXTURE_JSON)))
    });
    c.bench_function("transform_fixture", |b| {
        b.iter(|| etl.transform(black_box(response.clone())))
    });
}

criterion_group!(benches, bench_transform);
criterion_main!(benches);
