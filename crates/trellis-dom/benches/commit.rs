use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trellis_dom::{DocumentConfig, DomManager, NodeDescriptor, NodeId, RootId};
use trellis_testing::{ManualTaskRunner, NullRenderManager, StackLayoutService};

const ROOT: RootId = 1;
const LIST_SIZES: &[usize] = &[16, 64, 256, 1024];

/// A list container under the root followed by `rows` rows, each holding a
/// label. Ids start above the root id.
fn list_descriptors(rows: usize) -> Vec<NodeDescriptor> {
    let list: NodeId = 2;
    let mut nodes = Vec::with_capacity(1 + rows * 2);
    nodes.push(NodeDescriptor::new(list).tag("list").view("ListView"));
    for row in 0..rows as NodeId {
        let row_id = 3 + row * 2;
        nodes.push(
            NodeDescriptor::new(row_id)
                .parent(list)
                .tag("row")
                .view("View")
                .prop("height", 48),
        );
        nodes.push(
            NodeDescriptor::new(row_id + 1)
                .parent(row_id)
                .tag("text")
                .view("Text")
                .prop("text", format!("Item {row}")),
        );
    }
    nodes
}

struct CommitFixture {
    runner: Arc<ManualTaskRunner>,
    manager: DomManager,
}

impl CommitFixture {
    fn new(with_layout: bool) -> Self {
        let runner = ManualTaskRunner::new();
        let layout = with_layout
            .then(|| Box::new(StackLayoutService::new()) as Box<dyn trellis_dom::LayoutService>);
        let manager = DomManager::new(
            ROOT,
            DocumentConfig::default(),
            runner.clone(),
            Box::new(NullRenderManager),
            layout,
        );
        Self { runner, manager }
    }

    fn commit(&self, nodes: Vec<NodeDescriptor>) {
        self.manager.begin_batch().expect("begin_batch");
        self.manager.create_dom_nodes(nodes).expect("create");
        self.manager.end_batch().expect("end_batch");
        self.runner.run_until_idle();
    }

    fn delete_list(&self) {
        self.manager
            .delete_dom_node(vec![NodeDescriptor::new(2)])
            .expect("delete");
        self.runner.run_until_idle();
    }
}

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_create");
    for &rows in LIST_SIZES {
        group.bench_with_input(BenchmarkId::new("rows", rows), &rows, |b, &rows| {
            b.iter_batched(
                || (CommitFixture::new(false), list_descriptors(rows)),
                |(fixture, nodes)| {
                    fixture.commit(nodes);
                    black_box(fixture);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_create_with_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_create_layout");
    for &rows in LIST_SIZES {
        group.bench_with_input(BenchmarkId::new("rows", rows), &rows, |b, &rows| {
            b.iter_batched(
                || (CommitFixture::new(true), list_descriptors(rows)),
                |(fixture, nodes)| {
                    fixture.commit(nodes);
                    black_box(fixture);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let rows = 256;
    let fixture = CommitFixture::new(false);
    fixture.commit(list_descriptors(rows));
    let mut tick = 0i32;

    c.bench_function("commit_update_labels", |b| {
        b.iter(|| {
            tick = tick.wrapping_add(1);
            let updates = (0..rows as NodeId)
                .map(|row| NodeDescriptor::new(4 + row * 2).prop("text", tick))
                .collect();
            fixture.manager.begin_batch().expect("begin_batch");
            fixture.manager.update_dom_node(updates).expect("update");
            fixture.manager.end_batch().expect("end_batch");
            fixture.runner.run_until_idle();
        });
    });
}

fn bench_delete(c: &mut Criterion) {
    c.bench_function("commit_delete_list", |b| {
        b.iter_batched(
            || {
                let fixture = CommitFixture::new(false);
                fixture.commit(list_descriptors(256));
                fixture
            },
            |fixture| {
                fixture.delete_list();
                black_box(fixture);
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    commit,
    bench_create,
    bench_create_with_layout,
    bench_update,
    bench_delete
);
criterion_main!(commit);
