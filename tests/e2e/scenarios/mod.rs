mod fetching;
mod indexing;
