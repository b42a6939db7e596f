use {
  super::*,
  approx::assert_relative_eq,
  rand::SeedableRng,
  rand_pcg::Pcg64
};

fn moments(values: &[f32]) -> (f64, f64) {
  let n = values.len() as f64;
  let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
  let var = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
  (mean, var)
}

#[test] fn uniform_moments() -> Result<()> {
  let mut buffer = Buffer::new_2d(256, 256)?;
  fill(&mut buffer, Distribution::Uniform, &mut Pcg64::seed_from_u64(1));
  assert!(buffer.as_slice().iter().all(|v| (0.0..1.0).contains(v)));
  let (mean, var) = moments(buffer.as_slice());
  assert_relative_eq!(mean, 0.5, epsilon = 0.01);
  assert_relative_eq!(var, 1.0 / 12.0, epsilon = 0.005);
  Ok(())
}

#[test] fn gaussian_moments() -> Result<()> {
  let mut buffer = Buffer::new_2d(256, 256)?;
  fill(&mut buffer, Distribution::Gaussian, &mut Pcg64::seed_from_u64(2));
  let (mean, var) = moments(buffer.as_slice());
  assert_relative_eq!(mean, 0.0, epsilon = 0.02);
  assert_relative_eq!(var, 1.0, epsilon = 0.03);
  Ok(())
}

#[test] fn truncated_gaussian_stays_in_range() -> Result<()> {
  let mut buffer = Buffer::new_2d(256, 256)?;
  fill(&mut buffer, Distribution::TruncatedGaussian, &mut Pcg64::seed_from_u64(3));
  assert!(buffer.as_slice().iter().all(|v| v.abs() <= TRUNCATION as f32));
  let (mean, var) = moments(buffer.as_slice());
  assert_relative_eq!(mean, 0.0, epsilon = 0.02);
  // variance of a standard normal truncated at ±3
  assert_relative_eq!(var, 0.9733, epsilon = 0.03);
  Ok(())
}

#[test] fn successive_calls_differ() -> Result<()> {
  let mut store = BufferStore::new();
  let config = RandomFill::new(64, 64).with_distribution(Distribution::Gaussian);
  let a = create_random(&mut store, "a", &config)?;
  let b = create_random(&mut store, "b", &config)?;
  assert_ne!(store.get::<f32>(a)?, store.get::<f32>(b)?);
  Ok(())
}

#[test] fn seeded_calls_repeat() -> Result<()> {
  let mut store = BufferStore::new();
  let config = RandomFill::new(32, 16);
  let a = create_random_with(&mut store, "a", &config, &mut Pcg64::seed_from_u64(9))?;
  let b = create_random_with(&mut store, "b", &config, &mut Pcg64::seed_from_u64(9))?;
  assert_eq!(store.get::<f32>(a)?, store.get::<f32>(b)?);
  assert_eq!(store.get::<f32>(a)?.dims().as_slice(), &[32, 16]);
  Ok(())
}

#[test] fn rejects_empty_images() {
  let mut store = BufferStore::new();
  let err = create_random(&mut store, "empty", &RandomFill::new(0, 8)).err();
  assert!(matches!(
    err.as_ref().and_then(|e| e.downcast_ref::<Error>()),
    Some(Error::InvalidDimensions(_))
  ));
  assert!(store.is_empty());
}
