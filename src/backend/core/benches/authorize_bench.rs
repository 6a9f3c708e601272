//! Benchmarks for policy compilation and the authorization query path.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gatekeeper_core::rbac::{Action, AuthSubject, Checker, Preset, Resource, Role};

fn bench_compile_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_presets");
    for preset in Preset::all() {
        group.bench_with_input(BenchmarkId::from_parameter(preset.id()), &preset, |b, p| {
            b.iter(|| black_box(Checker::new(p.config()).is_ok()));
        });
    }
    group.finish();
}

fn bench_authorize_jwt(c: &mut Criterion) {
    let mut group = c.benchmark_group("authorize_jwt");
    let checker = Preset::Cms.checker();
    let resource = Resource::new("article");
    let cases = [
        ("granted", "editor", "publish"),
        ("denied", "reader", "publish"),
        ("unknown_role", "ghost", "read"),
    ];
    for (label, role, action) in cases {
        let subject = AuthSubject::jwt(role);
        let action = Action::new(action);
        group.bench_function(BenchmarkId::from_parameter(label), |b| {
            b.iter(|| black_box(checker.is_authorized(&subject, &resource, &action)));
        });
    }
    group.finish();
}

fn bench_authorize_api_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("authorize_api_key");
    let checker = Preset::Ecommerce.checker();
    let subject = AuthSubject::api_key(["catalog.read", "orders.create"]);
    let cases = [
        ("granted", "product", "view"),
        ("out_of_scope", "customer", "view"),
        ("unmapped_action", "order", "refund"),
    ];
    for (label, resource, action) in cases {
        let resource = Resource::new(resource);
        let action = Action::new(action);
        group.bench_function(BenchmarkId::from_parameter(label), |b| {
            b.iter(|| black_box(checker.is_authorized(&subject, &resource, &action)));
        });
    }
    group.finish();
}

fn bench_authorize_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("authorize_batch");
    let checker = Preset::FileManagement.checker();
    let subjects = [
        AuthSubject::jwt("admin"),
        AuthSubject::jwt("viewer"),
        AuthSubject::api_key(["read"]),
    ];
    let resource = Resource::new("file");
    let action = Action::new("read");
    for batch_size in [100, 1_000] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch_size, |b, &n| {
            b.iter(|| {
                for i in 0..n {
                    let subject = &subjects[i % subjects.len()];
                    black_box(checker.is_authorized(subject, &resource, &action));
                }
            });
        });
    }
    group.finish();
}

fn bench_role_elevation(c: &mut Criterion) {
    let checker = Preset::Ecommerce.checker();
    let admin = Role::new("admin");
    let customer = Role::new("customer");
    c.bench_function("is_role_elevated", |b| {
        b.iter(|| black_box(checker.is_role_elevated(&admin, &customer)));
    });
}

criterion_group!(
    benches,
    bench_compile_presets,
    bench_authorize_jwt,
    bench_authorize_api_key,
    bench_authorize_batch,
    bench_role_elevation
);
criterion_main!(benches);
