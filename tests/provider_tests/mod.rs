mod graphql_test;
mod http_test;
mod sql_test;
