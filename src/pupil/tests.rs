use {
  super::*,
  crate::{buffer::DataType, error::Result},
  approx::assert_relative_eq,
  rand::SeedableRng,
  rand_pcg::Pcg64,
  std::io::{Cursor, Write}
};

fn small() -> HexPupilConfig {
  HexPupilConfig::new(256, 100.0, 1.0, 20.0)
}

fn error_of<T: std::fmt::Debug>(result: Result<T>) -> Error {
  match result.map_err(|e| e.downcast::<Error>()) {
    Err(Ok(e)) => e,
    other => panic!("expected a typed error, got {other:?}")
  }
}

#[test] fn rejects_invalid_configs() {
  for config in [
    HexPupilConfig::new(0, 100.0, 1.0, 20.0),
    HexPupilConfig::new(256, -1.0, 1.0, 20.0),
    HexPupilConfig::new(256, 100.0, 1.0, 0.0),
    HexPupilConfig::new(256, 100.0, 20.0, 20.0),
    HexPupilConfig::new(256, 100.0, -0.5, 20.0),
    small().with_piston_error(PistonError::Segment { amplitude: 1.0, id: 0 }),
  ] {
    assert!(matches!(error_of(build_hex_pupil(&config)), Error::InvalidConfig(_)), "{config:?}");
  }
}

#[test] fn segment_count_is_reproducible() -> Result<()> {
  let config = HexPupilConfig::new(4096, 200.0, 2.0, 46.3).with_influence_functions(false);
  let a = build_hex_pupil(&config)?;
  let b = build_hex_pupil(&config)?;
  assert!(a.segment_count() >= 7);
  assert_eq!(a.segment_count(), b.segment_count());
  assert_eq!(a.pupil, b.pupil);
  assert!(a.influence.is_none() && a.phase.is_none());

  let n = a.segment_count() as f32;
  let labelled = a.pupil.as_slice().iter().filter(|&&v| v != 0.0).count();
  assert!(a.pupil.as_slice().iter().all(|&v| v.fract() == 0.0 && (0.0..=n).contains(&v)));
  assert_eq!(labelled, a.segments.iter().map(|s| s.pixel_count).sum::<usize>());

  // every segment lies inside the aperture
  for ((x, y, _), &v) in a.pupil.indexed() {
    if v != 0.0 {
      let r = ((x as f64 - 2048.0).powi(2) + (y as f64 - 2048.0).powi(2)).sqrt();
      assert!(r < 200.0, "segment {v} at ({x}, {y})");
    }
  }
  Ok(())
}

#[test] fn ids_follow_acceptance_order() -> Result<()> {
  let pupil = build_hex_pupil(&small().with_influence_functions(false))?;
  for (i, s) in pupil.segments.iter().enumerate() {
    assert_eq!(s.id, i + 1);
    assert!((s.centroid - s.center).length() < 1.0, "{s:?}");
    assert!(s.pixel_count > 0);
  }
  // center segment comes from the first lattice row through the origin
  let center = pupil.segments.iter()
    .find(|s| s.center == P2::new(128.0, 128.0))
    .map(|s| s.id);
  assert!(center.is_some());
  Ok(())
}

#[test] fn touching_segments_never_share_pixels() -> Result<()> {
  let pupil = build_hex_pupil(&HexPupilConfig::new(128, 50.0, 0.0, 10.0).with_influence_functions(false))?;
  let labelled = pupil.pupil.as_slice().iter().filter(|&&v| v != 0.0).count();
  assert_eq!(labelled, pupil.segments.iter().map(|s| s.pixel_count).sum::<usize>());
  Ok(())
}

#[test] fn influence_functions_are_normalized() -> Result<()> {
  let pupil = build_hex_pupil(&small())?;
  let cube = pupil.influence.as_ref().map(|c| c.dims());
  assert_eq!(cube.map(|d| d.z()), Some(3 * pupil.segment_count()));
  let cube = match &pupil.influence {
    Some(cube) => cube,
    None => panic!("influence functions requested")
  };
  for (i, s) in pupil.segments.iter().enumerate() {
    let plane = |k: usize| cube.plane(3 * i + k).map(|p| p.to_vec()).unwrap_or_default();
    let (piston, tip, tilt) = (plane(0), plane(1), plane(2));
    let n = s.pixel_count as f64;
    assert_relative_eq!(piston.iter().map(|&v| v as f64).sum::<f64>(), n);
    assert_relative_eq!(tip.iter().map(|&v| v as f64).sum::<f64>(), 0.0, epsilon = 1e-2);
    assert_relative_eq!(tilt.iter().map(|&v| v as f64).sum::<f64>(), 0.0, epsilon = 1e-2);
    assert_relative_eq!(tip.iter().map(|&v| (v * v) as f64).sum::<f64>(), n, max_relative = 1e-4);
    assert_relative_eq!(tilt.iter().map(|&v| (v * v) as f64).sum::<f64>(), n, max_relative = 1e-4);
    // modes vanish outside the segment
    for (p, &id) in piston.iter().zip(pupil.pupil.as_slice()) {
      assert_eq!(*p == 1.0, id == s.id as f32);
    }
  }
  Ok(())
}

#[test] fn targeted_piston_error() -> Result<()> {
  let config = small()
    .with_influence_functions(false)
    .with_piston_error(PistonError::Segment { amplitude: 0.5, id: 2 });
  let pupil = build_hex_pupil(&config)?;
  let phase = match &pupil.phase {
    Some(phase) => phase,
    None => panic!("phase requested")
  };
  for (&p, &id) in phase.as_slice().iter().zip(pupil.pupil.as_slice()) {
    assert_eq!(p, if id == 2.0 { 0.5 } else { 0.0 });
  }
  Ok(())
}

#[test] fn random_piston_error() -> Result<()> {
  let config = small()
    .with_influence_functions(false)
    .with_piston_error(PistonError::Random { amplitude: 0.25 });
  let a = build_hex_pupil_with(&config, &mut Pcg64::seed_from_u64(7))?;
  let b = build_hex_pupil_with(&config, &mut Pcg64::seed_from_u64(7))?;
  assert_eq!(a.phase, b.phase);

  let phase = match &a.phase {
    Some(phase) => phase,
    None => panic!("phase requested")
  };
  let mut pistons = Vec::new();
  for s in &a.segments {
    let values = s.pixels(&a.pupil).map(|(x, y)| phase[(x, y)]).collect::<Vec<_>>();
    assert!(values.iter().all(|&v| v == values[0]));
    assert!(values[0].abs() <= 0.25);
    pistons.push(values[0]);
  }
  assert!(pistons.iter().any(|&p| p != pistons[0]));
  // ids are unaffected by piston errors
  assert_eq!(a.pupil, build_hex_pupil(&config.clone().with_piston_error(PistonError::Random { amplitude: 0.0 }))?.pupil);
  Ok(())
}

#[test] fn empty_segments_are_degenerate() {
  let config = HexPupilConfig::new(64, 30.0, 9.9, 10.0);
  assert!(matches!(error_of(build_hex_pupil(&config)), Error::DegenerateGeometry(_)));
}

#[test] fn store_publication() -> Result<()> {
  let mut store = BufferStore::new();
  let ids = create_hex_pupil(&mut store, "hexpup", &small()
    .with_piston_error(PistonError::Random { amplitude: 1.0 }))?;
  assert_eq!(store.get_buffer("hexpup"), Some(ids.pupil));
  assert_eq!(store.get_buffer("hexpup_if"), ids.influence);
  assert_eq!(store.get_buffer("hexpup_pha"), ids.phase);
  assert_eq!(store.get::<f32>(ids.pupil)?.dims().as_slice(), &[256, 256]);
  assert!(ids.segment_count > 0);
  Ok(())
}

#[test] fn mask_levels_parse() -> Result<()> {
  let levels = MaskLevels::parse(Cursor::new("1 0\n\n3 1\n2 -15\n"), "fpm_level.txt")?;
  assert_eq!(levels.level(1), Some(15));
  assert_eq!(levels.level(2), Some(0));
  assert_eq!(levels.level(3), Some(16));
  assert_eq!(levels.level(4), None);
  assert_eq!(levels.level(0), None);
  assert!(levels.is_exported(1));
  assert!(!levels.is_exported(2));
  assert!(!levels.is_exported(3));

  // sparse indices are kept without sizing a table
  let sparse = MaskLevels::parse(Cursor::new("18446744073709551 3\n1 0\n"), "fpm_level.txt")?;
  assert_eq!(sparse.level(18446744073709551), Some(18));
  assert_eq!(sparse.level(1), Some(15));
  assert_eq!(sparse.level(2), None);

  for (text, line) in [("1 0\n2\n", 2), ("0 4\n", 1), ("1 x\n", 1), ("1 0\n18446744073709551616 3\n", 2)] {
    match error_of(MaskLevels::parse(Cursor::new(text), "fpm_level.txt")) {
      Error::MalformedFile { line: l, .. } => assert_eq!(l, line),
      e => panic!("{e}")
    }
  }
  Ok(())
}

#[test] fn mask_levels_file() -> Result<()> {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("fpm_level.txt");
  assert_eq!(MaskLevels::load(&path)?, None);

  let mut file = std::fs::File::create(&path)?;
  writeln!(file, "1 2")?;
  writeln!(file, "2 3")?;
  drop(file);
  let levels = MaskLevels::load(&path)?;
  assert_eq!(levels.as_ref().and_then(|l| l.level(2)), Some(18));
  Ok(())
}

#[test] fn vector_export() -> Result<()> {
  let index_map = Buffer::<u16>::filled(&[64, 64], 1)?;
  let exported = MaskLevels::parse(Cursor::new("1 0\n"), "levels")?;
  let config = small()
    .with_influence_functions(false)
    .with_vector_export(VectorExport::new(Some(exported), Some(index_map.clone())));
  let pupil = build_hex_pupil(&config)?;
  assert!(!pupil.outlines.is_empty());
  assert!(pupil.outlines.iter().all(|o| o.level == 15));

  let center = pupil.segments.iter()
    .find(|s| s.center == P2::new(128.0, 128.0))
    .map(|s| s.id);
  let outline = pupil.outlines.iter().find(|o| Some(o.segment) == center);
  assert_eq!(outline.map(|o| o.vertices[0]), Some((1900, 0)));
  assert_eq!(outline.map(|o| o.vertices[3]), Some((-1900, 0)));

  let hidden = MaskLevels::parse(Cursor::new("1 1\n"), "levels")?;
  let config = config.with_vector_export(VectorExport::new(Some(hidden), Some(index_map)));
  assert!(build_hex_pupil(&config)?.outlines.is_empty());

  let config = small()
    .with_influence_functions(false)
    .with_vector_export(VectorExport::new(Some(MaskLevels::default()), None));
  let pupil = build_hex_pupil(&config)?;
  assert!(pupil.outlines.is_empty() && pupil.segment_count() > 0);
  Ok(())
}

fn block(size: usize, x: std::ops::Range<usize>, y: std::ops::Range<usize>, value: f32) -> Result<Buffer<f32>> {
  let mut b = Buffer::new_2d(size, size)?;
  for (yy, xx) in itertools::iproduct!(y, x) {
    b[(xx, yy)] = value;
  }
  Ok(b)
}

#[test] fn segment_masks_to_modes() -> Result<()> {
  let a = block(8, 0..2, 0..2, 1.0)?;
  let b = block(8, 4..8, 2..4, 0.5)?;
  let SegmentModes { mask, modes, centroids } = segments_to_modes(&[&a, &b])?;
  assert_eq!(centroids, vec![P2::new(0.5, 0.5), P2::new(5.5, 2.5)]);
  assert_eq!(mask[(1, 1)], 1.0);
  assert_eq!(mask[(5, 3)], 1.0);
  assert_eq!(mask[(3, 3)], 0.0);
  assert_eq!(modes.zsize(), 6);
  assert_eq!(modes[(0, 0, 1)], -0.5);
  assert_eq!(modes[(7, 3, 4)], 0.75);
  assert_eq!(modes[(7, 3, 5)], 0.25);
  assert_eq!(modes[(0, 0, 4)], 0.0);

  assert!(matches!(error_of(segments_to_modes(&[])), Error::DegenerateGeometry(_)));
  let empty = Buffer::new_2d(8, 8)?;
  assert!(matches!(error_of(segments_to_modes(&[&a, &empty])), Error::DegenerateGeometry(_)));
  let other = block(4, 0..2, 0..2, 1.0)?;
  assert!(matches!(error_of(segments_to_modes(&[&a, &other])), Error::InvalidConfig(_)));
  Ok(())
}

#[test] fn segment_modes_from_store() -> Result<()> {
  let mut store = BufferStore::new();
  store.insert("seg00", block(8, 0..2, 0..2, 1.0)?);
  store.insert("seg01", block(8, 4..8, 4..8, 1.0)?);
  store.insert("seg03", block(8, 2..3, 2..3, 1.0)?);
  let id = create_segment_modes(&mut store, "seg", 2, "modes")?;
  assert_eq!(store.get::<f32>(id)?.zsize(), 6);
  assert!(store.get_buffer("modes_mask").is_some());

  assert!(matches!(error_of(create_segment_modes(&mut store, "seg", 7, "modes")), Error::InvalidConfig(_)));
  assert!(matches!(error_of(create_segment_modes(&mut store, "none", 2, "modes")), Error::DegenerateGeometry(_)));

  store.create_buffer("int0", &[8, 8], DataType::I32)?;
  assert!(matches!(error_of(create_segment_modes(&mut store, "int", 1, "modes")), Error::TypeMismatch { .. }));
  Ok(())
}
