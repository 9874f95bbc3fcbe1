mod launch;
mod lifecycle;
