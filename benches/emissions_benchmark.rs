use criterion::{criterion_group, criterion_main, Criterion};
use ecotrack::emissions::{calculate, MealType, VehicleType};
use ecotrack::models::activity::{EnergyData, FoodData, TransportData};
use ecotrack::models::ActivityDetails;
use serde_json::json;
use std::hint::black_box;

fn benchmark_calculate(c: &mut Criterion) {
    let transport = ActivityDetails::Transport(TransportData {
        vehicle_type: VehicleType::Suv,
        distance: 42.7,
    });
    let energy = ActivityDetails::Energy(EnergyData { electricity: 13.2 });
    let food = ActivityDetails::Food(FoodData {
        meal_type: MealType::HighMeat,
    });

    let mut group = c.benchmark_group("calculate");

    group.bench_function("transport", |b| b.iter(|| calculate(black_box(&transport))));
    group.bench_function("energy", |b| b.iter(|| calculate(black_box(&energy))));
    group.bench_function("food", |b| b.iter(|| calculate(black_box(&food))));

    group.finish();
}

fn benchmark_parse_and_calculate(c: &mut Criterion) {
    // Request bodies as they arrive from the form: numbers may be strings
    let activity_type = json!("transport");
    let data = json!({ "vehicleType": "Sedan", "distance": "18.5" });

    c.bench_function("parse_and_calculate_request", |b| {
        b.iter(|| {
            let details =
                ActivityDetails::from_request(Some(black_box(&activity_type)), Some(data.clone()))
                    .expect("valid payload");
            calculate(&details)
        })
    });
}

criterion_group!(benches, benchmark_calculate, benchmark_parse_and_calculate);
criterion_main!(benches);
