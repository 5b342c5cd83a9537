use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use property_price::config::PipelineConfig;
use property_price::features::FeatureDeriver;
use property_price::model::EstimatorKind;
use property_price::pipeline::TrainingPipeline;
use property_price::serving::{PropertyInput, ServingContext};
use property_price::table::csv_io::read_table_from;

const SUBURBS: [&str; 14] = [
    "Abbotsford", "Brunswick", "Carlton", "Doncaster", "Elwood", "Fitzroy", "Glen Iris",
    "Hawthorn", "Ivanhoe", "Kew", "Malvern", "Northcote", "Preston", "Richmond",
];

/// Synthetic raw sales file with `n` rows.
fn raw_csv(n: usize) -> String {
    let mut csv = String::from(
        "Suburb,Address,Rooms,Type,Price,Method,SellerG,Date,Distance,Postcode,Bedroom2,\
Bathroom,Car,Landsize,BuildingArea,YearBuilt,CouncilArea,Lattitude,Longtitude,Regionname,Propertycount\n",
    );
    for i in 0..n {
        let rooms = 1 + i % 5;
        let price = 300_000 + 175_000 * rooms + 1_000 * (i % 97);
        csv.push_str(&format!(
            "{s},{num} Main St,{rooms},{ty},{price},S,Agent{agent},{day}/{month}/2016,{dist}.5,{pc},\
{rooms},1,{car},{land},{area},{built},{s} City Council,-37.{lat},144.{lon},Northern Metropolitan,4000\n",
            s = SUBURBS[i % SUBURBS.len()],
            num = i + 1,
            ty = ["h", "u", "t"][i % 3],
            agent = i % 8,
            day = 1 + i % 28,
            month = 1 + i % 12,
            dist = 1 + i % 20,
            pc = 3000 + i % 60,
            car = i % 3,
            land = 100 + (i * 17) % 700,
            area = 50 + 20 * rooms,
            built = 1900 + (i * 3) % 120,
            lat = 700 + i % 300,
            lon = 900 + i % 99,
        ));
    }
    csv
}

fn trained_context(kind: EstimatorKind) -> ServingContext {
    let raw = read_table_from(raw_csv(2_000).as_bytes()).expect("synthetic csv");
    let pipeline = TrainingPipeline::new(PipelineConfig {
        estimators: vec![kind],
        selected_estimator: kind,
        ..PipelineConfig::default()
    });
    let artifacts = pipeline.train(raw).expect("training");
    ServingContext::new(artifacts.encoder, artifacts.estimator, FeatureDeriver::default())
        .expect("compatible artifacts")
}

fn property() -> PropertyInput {
    PropertyInput {
        latitude: Some(-37.81),
        longitude: Some(144.96),
        sale_date: Some("2017-03-15".to_string()),
        year_built: Some(1970),
        region_name: Some("Northern Metropolitan".to_string()),
        suburb: Some("Carlton".to_string()),
        council_area: Some("Carlton City Council".to_string()),
        distance_to_cbd: Some(3.5),
        postcode: Some(3053),
        neighbouring_properties: Some(4000),
        real_estate_agent: Some("Agent3".to_string()),
        land_size: Some(300),
        building_area: Some(110.0),
        rooms: Some(3),
        bedrooms: Some(3),
        bathrooms: Some(1),
        car_spots: Some(1),
    }
}

fn bench_predict_single(c: &mut Criterion) {
    let input = property();
    for kind in [EstimatorKind::Ridge, EstimatorKind::Knn] {
        let context = trained_context(kind);
        c.bench_with_input(BenchmarkId::new("predict_single", kind), &input, |b, input| {
            b.iter(|| black_box(context.predict(black_box(input))))
        });
    }
}

fn bench_predict_many(c: &mut Criterion) {
    let context = trained_context(EstimatorKind::Ridge);
    for batch_size in [10, 100, 1000].iter() {
        let inputs = vec![property(); *batch_size];
        c.bench_with_input(
            BenchmarkId::new("predict_many", batch_size),
            &inputs,
            |b, inputs| b.iter(|| black_box(context.predict_many(black_box(inputs)))),
        );
    }
}

criterion_group!(benches, bench_predict_single, bench_predict_many);
criterion_main!(benches);
