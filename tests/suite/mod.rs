mod cli;
mod persistence;
