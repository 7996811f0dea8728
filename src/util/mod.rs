pub mod err;
pub mod geometry;
#[cfg(feature = "tracing")]
pub mod trace;

#[cfg(test)]
mod test;
