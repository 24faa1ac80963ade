//! Hot-path benchmarks: cache mutation, dirty drain, and full flush cycles.
//!
//! The simulation loop reads and writes the Hot Cache on every play, so
//! these paths have to stay well under a millisecond for realistic league
//! sizes.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use gridiron::generate::{build_league, LeagueOptions, TeamDef};
use gridiron::storage::InMemoryStores;
use gridiron::{FlushCoordinator, HotCache, LeagueSettings, PlayerId, StatDelta, TeamId};

fn defs(n: usize) -> Vec<TeamDef> {
    (0..n)
        .map(|i| TeamDef {
            name: format!("City {i}"),
            abbr: format!("C{i}"),
            conference: if i % 2 == 0 { "East" } else { "West" }.to_string(),
            division: "North".to_string(),
        })
        .collect()
}

fn league_cache() -> HotCache {
    let options = LeagueOptions {
        settings: LeagueSettings {
            roster_size: 40,
            ..LeagueSettings::default()
        },
        ..LeagueOptions::default()
    };
    let snapshot = build_league(&defs(32), &options).expect("league build");
    let mut cache = HotCache::new();
    cache.hydrate(snapshot);
    cache
}

fn bench_team_updates(c: &mut Criterion) {
    let mut cache = league_cache();
    c.bench_function("update_team_record", |b| {
        b.iter(|| {
            for id in 0..32 {
                cache.update_team(TeamId(id), |t| {
                    t.record.apply_result(black_box(24), black_box(10));
                });
            }
        });
    });
}

fn bench_stat_accumulation(c: &mut Criterion) {
    let mut cache = league_cache();
    let delta = StatDelta {
        games: Some(1),
        pass_yd: Some(250),
        pass_td: Some(2),
        ..StatDelta::default()
    };
    c.bench_function("update_season_stat_x100", |b| {
        b.iter(|| {
            for id in 1..=100 {
                cache.update_season_stat(PlayerId(id), TeamId(0), black_box(&delta));
            }
        });
    });
}

fn bench_flush_cycle(c: &mut Criterion) {
    c.bench_function("dirty_week_flush", |b| {
        let stores = InMemoryStores::handles();
        let coordinator = FlushCoordinator::new(stores);
        b.iter_batched(
            || {
                // A realistic week: every team record touched, a few dozen
                // stat lines, nothing else.
                let mut cache = league_cache();
                let _ = cache.drain_dirty();
                for id in 0..32 {
                    cache.update_team(TeamId(id), |t| t.record.apply_result(21, 17));
                }
                for id in 1..=64 {
                    cache.update_season_stat(
                        PlayerId(id),
                        TeamId(0),
                        &StatDelta {
                            rush_yd: Some(80),
                            ..StatDelta::default()
                        },
                    );
                }
                cache
            },
            |mut cache| {
                coordinator.flush(&mut cache).expect("flush");
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_team_updates,
    bench_stat_accumulation,
    bench_flush_cycle
);
criterion_main!(benches);
