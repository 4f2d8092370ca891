use std::sync::Arc;

use glam::Vec2;

use oxideviews::data::column_store::ColumnStore;
use oxideviews::data::loader::{self, LoadedTable};
use oxideviews::processing::histogram::Histogram;
use oxideviews::processing::normalize::{normalize, NormalizationStyle};
use oxideviews::processing::rank_cache::{stable_rank, RankCache};
use oxideviews::state::plot_set::{DeletionPhase, PlotSet, PlotSetOptions};
use oxideviews::state::plot_view::AxisChoice;

fn ten_points() -> LoadedTable {
    LoadedTable {
        labels: vec!["x".into(), "y".into()],
        columns: vec![
            (0..10).map(|i| i as f32).collect(),
            (0..10).map(|i| ((i * 3) % 7) as f32).collect(),
        ],
    }
}

fn ten_point_set() -> PlotSet {
    PlotSet::from_table(ten_points(), 1, PlotSetOptions::default()).unwrap()
}

#[test]
fn rectangle_selects_upper_half_of_minmax_column() {
    let mut set = ten_point_set();
    set.select_rect(0, Vec2::new(-0.1, -10.0), Vec2::new(1.0, 10.0), false);

    assert_eq!(set.nselected(), 5);
    for row in 0..10 {
        let expected = if row >= 5 { 1 } else { 0 };
        assert_eq!(set.selection().owner_of(row), expected, "row {row}");
    }
}

#[test]
fn histogram_of_uniform_points() {
    let values: Vec<f32> = (0..128).map(|i| -1.0 + 2.0 * i as f32 / 127.0).collect();
    let hist = Histogram::compute(values.iter().copied(), -1.0, 1.0, 4, |_| false);

    assert_eq!(hist.edges(), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    // 32 points per bin, scaled by (4 / 128) / 128.
    let expected = 32.0 * (4.0 / 128.0) / 128.0;
    for &c in &hist.counts {
        assert!((c - expected).abs() < 1e-6, "count {c}");
    }
    assert!(hist.selected_counts.iter().all(|&c| c == 0.0));
}

#[test]
fn linked_axes_follow_pan() {
    let table = LoadedTable {
        labels: vec!["a".into(), "mass".into(), "b".into(), "radius".into(), "c".into()],
        columns: (0..5)
            .map(|k| (0..20).map(|i| ((i * (k + 2)) % 11) as f32 + k as f32).collect())
            .collect(),
    };
    let mut set = PlotSet::from_table(table, 3, PlotSetOptions::default()).unwrap();
    let mass = 1;
    let radius = 3;
    for (plot, x, y) in [(0, 0, mass), (1, 2, mass), (2, 4, radius)] {
        set.set_axis(plot, 0, AxisChoice::Column(x));
        set.set_axis(plot, 1, AxisChoice::Column(y));
        set.set_style(plot, 1, NormalizationStyle::MinMax);
    }
    let radius_center = set.plot(2).view.center;

    set.link_axes = true;
    set.pan(0, Vec2::new(0.0, 0.3));

    let a = set.plot(0).view.center;
    let b = set.plot(1).view.center;
    assert!((a.y - radius_center.y).abs() > 1e-4);
    assert_eq!(b.y, a.y);
    assert_eq!(set.plot(1).view.scale().y, set.plot(0).view.scale().y);
    assert_eq!(set.plot(2).view.center, radius_center);
}

#[test]
fn pan_without_linking_moves_one_plot() {
    let mut set = PlotSet::from_table(ten_points(), 2, PlotSetOptions::default()).unwrap();
    set.set_axis(1, 0, AxisChoice::Column(0));
    set.set_axis(1, 1, AxisChoice::Column(1));
    let before = set.plot(1).view.center;
    set.pan(0, Vec2::new(0.2, 0.2));
    assert_eq!(set.plot(1).view.center, before);
}

#[test]
fn invert_twice_restores_selection() {
    let mut set = ten_point_set();
    set.select_rect(0, Vec2::new(-0.1, -10.0), Vec2::new(1.0, 10.0), false);
    let owner = set.selection().owner().to_vec();

    set.invert();
    assert!(set.is_inverted());
    assert_eq!(set.nselected(), 5);
    assert_eq!(set.selection().owner_of(0), 1);
    assert_eq!(set.selection().owner_of(9), 0);

    set.invert();
    assert!(!set.is_inverted());
    assert_eq!(set.selection().owner(), owner.as_slice());
}

#[test]
fn delete_selected_compacts_in_order() {
    let mut set = ten_point_set();
    set.select_rect(0, Vec2::new(-0.1, -10.0), Vec2::new(1.0, 10.0), false);

    assert_eq!(set.delete_selected(), 5);
    assert_eq!(set.npoints(), 5);
    assert_eq!(set.store().column(0), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(set.nselected(), 0);
    assert_eq!(set.plot(0).vertices().len(), 5);
    assert_eq!(
        set.last_deletion_phases(),
        &[
            DeletionPhase::DeletionRequested,
            DeletionPhase::Compacting,
            DeletionPhase::RanksInvalid,
            DeletionPhase::Rebuilding,
            DeletionPhase::Stable,
        ]
    );
    assert_eq!(set.deletion_phase(), DeletionPhase::Stable);
}

#[test]
fn deleting_everything_keeps_two_rows() {
    let mut set = ten_point_set();
    set.select_rect(0, Vec2::splat(-10.0), Vec2::splat(10.0), false);
    assert_eq!(set.nselected(), 10);

    assert_eq!(set.delete_selected(), 8);
    assert_eq!(set.npoints(), 2);
    assert_eq!(set.store().column(0), &[0.0, 1.0]);
    assert!(set.warning_message().unwrap().contains("2 rows were kept"));
}

#[test]
fn single_survivor_is_topped_up_to_two_rows() {
    let mut set = ten_point_set();
    // Rows 0..=8 are at normalized x <= 7/9; row 9 sits at 1.0.
    set.select_rect(0, Vec2::new(-2.0, -10.0), Vec2::new(0.8, 10.0), false);
    assert_eq!(set.nselected(), 9);

    assert_eq!(set.delete_selected(), 8);
    assert_eq!(set.npoints(), 2);
    assert_eq!(set.store().column(0), &[0.0, 9.0]);
    assert_eq!(set.plot(0).vertices().len(), 2);
    assert!(set.warning_message().unwrap().contains("leave 1 rows"));
}

#[test]
fn rank_cache_sorts_each_column_once() {
    let (store, _) = ColumnStore::from_table(ten_points()).unwrap();
    let mut cache = RankCache::new();

    let first = cache.rank_of(&store, 1);
    let second = cache.rank_of(&store, 1);
    assert_eq!(cache.sorts_performed(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(cache.is_cached(1, store.generation()));
}

#[test]
fn rank_style_preserves_order_when_reapplied() {
    let original = [3.5f32, -1.0, 7.25, 0.0, 3.5, 12.0, -4.0];
    let rank = stable_rank(&original);

    let mut once = original.to_vec();
    normalize(&mut once, &rank, NormalizationStyle::Rank);
    let rerank = stable_rank(&once);
    assert_eq!(rerank, rank);

    let mut twice = once.clone();
    normalize(&mut twice, &rerank, NormalizationStyle::Rank);
    assert_eq!(stable_rank(&twice), rank);
}

#[test]
fn every_style_returns_a_finite_nonempty_range() {
    let columns: [Vec<f32>; 3] = [
        vec![0.5, 2.0, -3.0, 8.0, 1e-3, 4.0],
        vec![5.0, 5.0, 5.0, 5.0],
        vec![-2.0, -1.0, 0.0, 1e30, 2.0],
    ];
    for values in &columns {
        let rank = stable_rank(values);
        for style in NormalizationStyle::ALL {
            let mut working = values.clone();
            let result = normalize(&mut working, &rank, style);
            assert!(result.world_min.is_finite(), "{style:?}");
            assert!(result.world_max.is_finite(), "{style:?}");
            assert!(result.world_min < result.world_max, "{style:?} on {values:?}");
        }
    }
}

#[test]
fn export_selected_then_reload() {
    let mut set = ten_point_set();
    set.select_rect(0, Vec2::new(-0.1, -10.0), Vec2::new(1.0, 10.0), false);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("selected.csv");
    assert_eq!(set.export_csv(&path, true).unwrap(), 5);

    let (table, warnings) = loader::load_file(&path, 0).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(table.labels, vec!["x", "y"]);
    assert_eq!(table.columns[0], vec![5.0, 6.0, 7.0, 8.0, 9.0]);

    set.replace_table(table).unwrap();
    assert_eq!(set.npoints(), 5);
    assert_eq!(set.nselected(), 0);
}
