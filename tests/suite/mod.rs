mod accounts;
mod concurrency;
mod networks;
mod nodes;
