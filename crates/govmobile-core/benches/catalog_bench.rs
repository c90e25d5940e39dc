//! Benchmarks for building the device listing.

#![allow(clippy::unwrap_used)]

use criterion::{Criterion, criterion_group, criterion_main};
use govmobile_core::catalog::{CatalogQuery, CatalogView, DeviceSort};
use govmobile_core::{Device, RoleLevel, User};
use std::hint::black_box;

const BRANDS: [&str; 5] = ["Apple", "Samsung", "Nokia", "Cat", "Google"];

fn catalog(size: usize) -> Vec<Device> {
    (0..size)
        .map(|i| {
            let roles = &RoleLevel::ALL[i % 4..];
            Device::new(
                format!("d{i}"),
                BRANDS[i % BRANDS.len()],
                format!("Model {i}"),
                (i as u64 * 37) % 6000,
            )
            .with_eligibility(roles.iter().copied())
        })
        .collect()
}

fn bench_catalog_view(c: &mut Criterion) {
    let user = User::new("u", "u@gov.il", "U")
        .with_role(RoleLevel::Premium)
        .with_budget(3000, 2500);
    let devices = catalog(1000);

    c.bench_function("catalog_view_default", |b| {
        b.iter(|| {
            CatalogView::build(
                black_box(devices.clone()),
                black_box(&user),
                &CatalogQuery::default(),
            )
        });
    });

    let search = CatalogQuery {
        search: Some("model 1".to_string()),
        sort: DeviceSort::Model,
        ..CatalogQuery::default()
    };
    c.bench_function("catalog_view_search_by_model", |b| {
        b.iter(|| CatalogView::build(black_box(devices.clone()), black_box(&user), &search));
    });
}

criterion_group!(benches, bench_catalog_view);
criterion_main!(benches);
