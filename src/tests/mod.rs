use fixture::Fixture;


mod actions;
mod primitives;
