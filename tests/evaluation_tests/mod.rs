mod alias_test;
mod cache_test;
mod operators_test;
mod options_test;
