use {
  super::*,
  crate::{
    error::Result,
    geometry::P2,
    raster::make_disk,
    voronoi::{voronoi_partition, Seed, SeedList, VoronoiConfig}
  }
};

#[test] fn disk_to_luma() -> Result<()> {
  let mut disk = Buffer::new_2d(64, 64)?;
  make_disk(&mut disk, P2::new(32.0, 32.0), 20.0);
  let image = to_luma(&disk);
  assert_eq!(image.dimensions(), (64, 64));
  assert_eq!(image.get_pixel(32, 32), &Luma([255]));
  assert_eq!(image.get_pixel(0, 0), &Luma([0]));

  let dir = tempfile::tempdir()?;
  image.save(dir.path().join("disk.png"))?;
  Ok(())
}

#[test] fn constant_buffers_render_black() -> Result<()> {
  let flat = Buffer::filled(&[8, 4], 3.0f32)?;
  assert!(to_luma(&flat).pixels().all(|p| p == &Luma([0])));
  Ok(())
}

#[test] fn voronoi_labels() -> Result<()> {
  let seeds = SeedList::new([Seed::new(1, 0.25, 0.5), Seed::new(2, 0.75, 0.5)]);
  let labels = voronoi_partition(&seeds, &VoronoiConfig::new(64, 32).with_gap(0.05))?;
  let image = label_map(&labels);
  assert_eq!(image.get_pixel(16, 16), &label_color(1));
  assert_eq!(image.get_pixel(48, 16), &label_color(2));
  assert_eq!(image.get_pixel(32, 16), &Rgb([0, 0, 0]));
  assert_ne!(label_color(1), label_color(2));
  assert_eq!(label_color(7), label_color(7));

  let dir = tempfile::tempdir()?;
  image.save(dir.path().join("voronoi.png"))?;
  Ok(())
}
