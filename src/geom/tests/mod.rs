#[cfg(feature = "triangulation")]
mod test_mesh_basic;
