#![allow(missing_docs)]

use std::collections::HashMap;
use std::path::Path;

use macadam::{
    AttributeKind, AttributeTable, EdgeFieldColumn, EdgeId, GraphExtension, MemRegion, MmapRegion,
    Region, RegionDirectory, RegionKind, Result, StoreError, ABSENT_VALUE, NO_ENTRY,
};
use proptest::prelude::*;
use tempfile::tempdir;

const REGION_NAME: &str = "road_attributes";
const SEGMENT: u32 = 256;

fn mapped_table(root: &Path) -> Result<AttributeTable> {
    let mut directory = RegionDirectory::open(root, RegionKind::MemoryMapped)?;
    let table = AttributeTable::new(directory.find(REGION_NAME)?);
    directory.flush()?;
    Ok(table)
}

fn add(
    table: &mut AttributeTable,
    edges: &mut EdgeFieldColumn,
    edge: EdgeId,
    kind: AttributeKind,
    value: i32,
) -> Result<()> {
    table.add_attribute(&mut edges.slot(edge)?, kind, value)
}

fn get(
    table: &AttributeTable,
    edges: &mut EdgeFieldColumn,
    edge: EdgeId,
    kind: AttributeKind,
) -> Result<i32> {
    let slot = edges.slot(edge)?;
    table.attribute(&slot, kind)
}

#[test]
fn example_scenario_survives_reload() -> Result<()> {
    let dir = tempdir()?;
    let e1 = EdgeId(0);
    let e2 = EdgeId(1);
    let mut edges;
    {
        let mut table = mapped_table(dir.path())?;
        table.set_segment_size(SEGMENT)?;
        table.create(8)?;
        edges = EdgeFieldColumn::new(3, table.default_edge_field_value());
        add(&mut table, &mut edges, e1, AttributeKind::Height, 44)?;
        add(&mut table, &mut edges, e1, AttributeKind::Weight, 40)?;
        add(&mut table, &mut edges, e1, AttributeKind::Length, 120)?;
        add(&mut table, &mut edges, e1, AttributeKind::Width, 200)?;
        add(&mut table, &mut edges, e2, AttributeKind::Length, 120)?;
        table.flush()?;
        table.close()?;
        assert!(table.is_closed());
    }

    let mut table = mapped_table(dir.path())?;
    assert!(table.load_existing()?);
    assert_eq!(table.entry_count(), 5);
    assert_eq!(get(&table, &mut edges, e1, AttributeKind::Height)?, 44);
    assert_eq!(get(&table, &mut edges, e1, AttributeKind::Weight)?, 40);
    assert_eq!(get(&table, &mut edges, e1, AttributeKind::Length)?, 120);
    assert_eq!(get(&table, &mut edges, e1, AttributeKind::Width)?, 200);
    assert_eq!(get(&table, &mut edges, e2, AttributeKind::Length)?, 120);
    assert_eq!(
        get(&table, &mut edges, e2, AttributeKind::Height)?,
        ABSENT_VALUE
    );
    // an edge that never received anything answers absent for every kind
    for kind in AttributeKind::ALL {
        assert_eq!(get(&table, &mut edges, EdgeId(2), kind)?, ABSENT_VALUE);
    }
    Ok(())
}

#[test]
fn entry_width_mismatch_is_rejected_on_reload() -> Result<()> {
    let dir = tempdir()?;
    {
        let mut table = mapped_table(dir.path())?;
        table.set_segment_size(SEGMENT)?;
        table.create(8)?;
        let mut edges = EdgeFieldColumn::new(1, NO_ENTRY);
        add(&mut table, &mut edges, EdgeId(0), AttributeKind::OsmId, 7)?;
        table.flush()?;
        table.close()?;
    }
    {
        // sabotage the persisted entry width behind the table's back
        let mut region = MmapRegion::new(REGION_NAME, dir.path().join(REGION_NAME));
        assert!(region.load_existing()?);
        region.set_header(0, 16)?;
        region.flush()?;
        region.close()?;
    }
    let mut table = mapped_table(dir.path())?;
    assert!(matches!(
        table.load_existing(),
        Err(StoreError::Corruption(_))
    ));
    Ok(())
}

#[test]
fn volatile_regions_report_nothing_to_load() -> Result<()> {
    let dir = tempdir()?;
    let mut directory = RegionDirectory::open(dir.path(), RegionKind::InMemory)?;
    let mut table = AttributeTable::new(directory.find(REGION_NAME)?);
    assert!(!table.load_existing()?);
    Ok(())
}

#[test]
fn clone_matches_source_lookups() -> Result<()> {
    let dir = tempdir()?;
    let mut table = mapped_table(dir.path())?;
    table.set_segment_size(SEGMENT)?;
    table.create(8)?;
    let mut edges = EdgeFieldColumn::new(2, NO_ENTRY);
    add(&mut table, &mut edges, EdgeId(0), AttributeKind::Height, 44)?;
    add(&mut table, &mut edges, EdgeId(1), AttributeKind::Weight, 40)?;
    add(&mut table, &mut edges, EdgeId(0), AttributeKind::Length, 120)?;

    let mut clone = AttributeTable::new(Box::new(MmapRegion::new(
        "road_attributes_copy",
        dir.path().join("road_attributes_copy"),
    )));
    clone.set_segment_size(SEGMENT)?;
    clone.create(1)?;
    table.copy_to(&mut clone)?;

    assert_eq!(clone.entry_count(), table.entry_count());
    for edge in [EdgeId(0), EdgeId(1)] {
        for kind in AttributeKind::ALL {
            assert_eq!(
                get(&clone, &mut edges, edge, kind)?,
                get(&table, &mut edges, edge, kind)?
            );
        }
    }
    Ok(())
}

#[test]
fn capacity_is_monotonic_across_many_appends() -> Result<()> {
    let dir = tempdir()?;
    let mut table = mapped_table(dir.path())?;
    table.set_segment_size(SEGMENT)?;
    table.create(1)?;
    let mut edges = EdgeFieldColumn::new(4, NO_ENTRY);
    let mut previous = table.capacity();
    for round in 1..=300i32 {
        let edge = EdgeId((round % 4) as u32);
        add(&mut table, &mut edges, edge, AttributeKind::OsmId, round)?;
        assert!(table.capacity() >= previous);
        assert_eq!(table.capacity() % u64::from(SEGMENT), 0);
        previous = table.capacity();
    }
    Ok(())
}

proptest! {
    // Model check: lookups return the first value appended per
    // (edge, kind), zeros are dropped, and edges never interfere.
    #[test]
    fn lookup_matches_first_write_wins_model(
        ops in prop::collection::vec((0u32..6, 0i32..5, any::<i32>()), 0..64)
    ) {
        let mut region = MemRegion::new(REGION_NAME);
        region.set_segment_size(SEGMENT).unwrap();
        let mut table = AttributeTable::new(Box::new(region));
        table.create(4).unwrap();
        let mut edges = EdgeFieldColumn::new(6, NO_ENTRY);
        let mut model: HashMap<(u32, i32), i32> = HashMap::new();

        for (edge, code, value) in ops {
            let kind = AttributeKind::from_code(code).unwrap();
            table
                .add_attribute(&mut edges.slot(EdgeId(edge)).unwrap(), kind, value)
                .unwrap();
            if value != ABSENT_VALUE {
                model.entry((edge, code)).or_insert(value);
            }
        }

        for edge in 0..6u32 {
            for kind in AttributeKind::ALL {
                let expected = model
                    .get(&(edge, kind.code()))
                    .copied()
                    .unwrap_or(ABSENT_VALUE);
                let slot = edges.slot(EdgeId(edge)).unwrap();
                prop_assert_eq!(table.attribute(&slot, kind).unwrap(), expected);
            }
        }
    }
}
