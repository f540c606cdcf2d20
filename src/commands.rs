//! Command table
//!
//! Every command wrapper is one line of a declarative table: method name,
//! argument shape, result type, and wire name. The table expands into
//! provided methods of [`Commands`], all of which funnel into one generic
//! [`Commands::dispatch`]. The direct [`Client`](crate::Client) answers each
//! call with `Result<T>`; a [`Pipeline`](crate::Pipeline) answers with a
//! [`ResultCell<T>`](crate::ResultCell).
//!
//! ## Table syntax
//! ```text
//! fn name(fixed, args) -> Type = "WIRE";            fixed arity
//! fn name(fixed; tail) -> Type = "WIRE";            fixed + variadic slice
//! fn name(fixed) -> Type = "WIRE" + "SUFFIX";       constant trailing words
//! ```

use crate::binder::{FromReply, List, Mapping, Text};
use crate::protocol::{Request, ToArg};

macro_rules! command_table {
    ($(
        $(#[$doc:meta])*
        fn $method:ident($($arg:ident),* $(; $rest:ident)?) -> $out:ty = $name:literal $(+ $suffix:literal)*;
    )*) => {
        $(
            $(#[$doc])*
            fn $method(&mut self $(, $arg: impl ToArg)* $(, $rest: &[impl ToArg])?) -> Self::Output<$out> {
                let request = Request::command($name)$(.arg($arg))*;
                $(let request = request.args($rest.iter());)?
                let request = request$(.arg($suffix))*;
                self.dispatch::<$out>(request)
            }
        )*
    };
}

/// The command surface shared by the direct and batched engines
pub trait Commands {
    /// What a call hands back: a bound value or a handle to one
    type Output<T: FromReply>;

    /// Execute or enqueue one request, binding its reply as `T`
    fn dispatch<T: FromReply>(&mut self, request: Request) -> Self::Output<T>;

    // =========================================================================
    // Keys
    // =========================================================================
    command_table! {
        fn del(; keys) -> i64 = "DEL";
        fn exists(key) -> i64 = "EXISTS";
        fn expire(key, seconds) -> i64 = "EXPIRE";
        fn expireat(key, timestamp) -> i64 = "EXPIREAT";
        fn keys(pattern) -> List = "KEYS";
        /// `MOVE key db`
        fn move_key(key, db) -> i64 = "MOVE";
        fn persist(key) -> i64 = "PERSIST";
        fn randomkey() -> Text = "RANDOMKEY";
        fn rename(key, new_key) -> Text = "RENAME";
        fn renamenx(key, new_key) -> i64 = "RENAMENX";
        fn ttl(key) -> i64 = "TTL";
        /// `TYPE key`
        fn key_type(key) -> Text = "TYPE";
    }

    // =========================================================================
    // Strings
    // =========================================================================
    command_table! {
        fn append(key, value) -> i64 = "APPEND";
        fn decr(key) -> i64 = "DECR";
        fn decrby(key, decrement) -> i64 = "DECRBY";
        fn get(key) -> Text = "GET";
        fn getbit(key, offset) -> i64 = "GETBIT";
        fn getrange(key, start, end) -> Text = "GETRANGE";
        fn getset(key, value) -> Text = "GETSET";
        fn incr(key) -> i64 = "INCR";
        fn incrby(key, increment) -> i64 = "INCRBY";
        fn mget(; keys) -> List = "MGET";
        /// Alternating keys and values
        fn mset(; key_values) -> Text = "MSET";
        /// Alternating keys and values
        fn msetnx(; key_values) -> i64 = "MSETNX";
        fn set(key, value) -> Text = "SET";
        fn setbit(key, offset, value) -> i64 = "SETBIT";
        fn setex(key, seconds, value) -> Text = "SETEX";
        fn setnx(key, value) -> i64 = "SETNX";
        fn setrange(key, offset, value) -> i64 = "SETRANGE";
        fn strlen(key) -> i64 = "STRLEN";
    }

    // =========================================================================
    // Hashes
    // =========================================================================
    command_table! {
        fn hdel(key; fields) -> i64 = "HDEL";
        fn hexists(key, field) -> i64 = "HEXISTS";
        fn hget(key, field) -> Text = "HGET";
        fn hgetall(key) -> Mapping = "HGETALL";
        fn hincrby(key, field, increment) -> i64 = "HINCRBY";
        fn hkeys(key) -> List = "HKEYS";
        fn hlen(key) -> i64 = "HLEN";
        fn hmget(key; fields) -> List = "HMGET";
        /// Alternating fields and values
        fn hmset(key; field_values) -> Text = "HMSET";
        fn hset(key, field, value) -> i64 = "HSET";
        fn hsetnx(key, field, value) -> i64 = "HSETNX";
        fn hvals(key) -> List = "HVALS";
    }

    // =========================================================================
    // Lists
    // =========================================================================
    command_table! {
        fn brpoplpush(source, destination, timeout) -> Text = "BRPOPLPUSH";
        fn lindex(key, index) -> Text = "LINDEX";
        /// `LINSERT key BEFORE|AFTER pivot value`
        fn linsert(key, position, pivot, value) -> i64 = "LINSERT";
        fn llen(key) -> i64 = "LLEN";
        fn lpop(key) -> Text = "LPOP";
        fn lpush(key; values) -> i64 = "LPUSH";
        fn lpushx(key, value) -> i64 = "LPUSHX";
        fn lrange(key, start, stop) -> List = "LRANGE";
        fn lrem(key, count, value) -> i64 = "LREM";
        fn lset(key, index, value) -> Text = "LSET";
        fn ltrim(key, start, stop) -> Text = "LTRIM";
        fn rpop(key) -> Text = "RPOP";
        fn rpoplpush(source, destination) -> Text = "RPOPLPUSH";
        fn rpush(key; values) -> i64 = "RPUSH";
        fn rpushx(key, value) -> i64 = "RPUSHX";
    }

    // =========================================================================
    // Sets
    // =========================================================================
    command_table! {
        fn sadd(key; members) -> i64 = "SADD";
        fn scard(key) -> i64 = "SCARD";
        fn sdiff(; keys) -> List = "SDIFF";
        fn sdiffstore(destination; keys) -> i64 = "SDIFFSTORE";
        fn sinter(; keys) -> List = "SINTER";
        fn sinterstore(destination; keys) -> i64 = "SINTERSTORE";
        fn sismember(key, member) -> i64 = "SISMEMBER";
        fn smembers(key) -> List = "SMEMBERS";
        fn smove(source, destination, member) -> i64 = "SMOVE";
        fn spop(key) -> Text = "SPOP";
        fn srandmember(key) -> Text = "SRANDMEMBER";
        fn srem(key; members) -> i64 = "SREM";
        fn sunion(; keys) -> List = "SUNION";
        fn sunionstore(destination; keys) -> i64 = "SUNIONSTORE";
    }

    // =========================================================================
    // Sorted Sets
    // =========================================================================
    command_table! {
        /// Alternating scores and members
        fn zadd(key; score_members) -> i64 = "ZADD";
        fn zcard(key) -> i64 = "ZCARD";
        fn zcount(key, min, max) -> i64 = "ZCOUNT";
        fn zincrby(key, increment, member) -> Text = "ZINCRBY";
        fn zrange(key, start, stop) -> List = "ZRANGE";
        fn zrange_with_scores(key, start, stop) -> List = "ZRANGE" + "WITHSCORES";
        fn zrangebyscore(key, min, max) -> List = "ZRANGEBYSCORE";
        fn zrangebyscore_with_scores(key, min, max) -> List = "ZRANGEBYSCORE" + "WITHSCORES";
        /// `None` when the member or the key does not exist
        fn zrank(key, member) -> Option<i64> = "ZRANK";
        fn zrem(key; members) -> i64 = "ZREM";
        fn zremrangebyrank(key, start, stop) -> i64 = "ZREMRANGEBYRANK";
        fn zremrangebyscore(key, min, max) -> i64 = "ZREMRANGEBYSCORE";
        fn zrevrange(key, start, stop) -> List = "ZREVRANGE";
        fn zrevrange_with_scores(key, start, stop) -> List = "ZREVRANGE" + "WITHSCORES";
        fn zrevrangebyscore(key, max, min) -> List = "ZREVRANGEBYSCORE";
        fn zrevrangebyscore_with_scores(key, max, min) -> List = "ZREVRANGEBYSCORE" + "WITHSCORES";
        /// `None` when the member or the key does not exist
        fn zrevrank(key, member) -> Option<i64> = "ZREVRANK";
        fn zscore(key, member) -> Text = "ZSCORE";
    }

    // =========================================================================
    // Connection, Transactions, Server
    // =========================================================================
    command_table! {
        fn auth(password) -> Text = "AUTH";
        fn echo(message) -> Text = "ECHO";
        fn ping() -> Text = "PING";
        fn quit() -> Text = "QUIT";
        fn select(index) -> Text = "SELECT";

        fn watch(; keys) -> Text = "WATCH";
        fn unwatch() -> Text = "UNWATCH";

        fn bgrewriteaof() -> Text = "BGREWRITEAOF";
        fn bgsave() -> Text = "BGSAVE";
        fn dbsize() -> i64 = "DBSIZE";
        fn flushall() -> Text = "FLUSHALL";
        fn flushdb() -> Text = "FLUSHDB";
        fn info() -> Text = "INFO";
        fn lastsave() -> i64 = "LASTSAVE";
        fn save() -> Text = "SAVE";
    }

    // =========================================================================
    // Irregular Shapes
    // =========================================================================

    /// `BLPOP key [key ...] timeout`
    fn blpop(&mut self, keys: &[impl ToArg], timeout: u64) -> Self::Output<List> {
        let request = Request::command("BLPOP").args(keys.iter()).arg(timeout);
        self.dispatch::<List>(request)
    }

    /// `BRPOP key [key ...] timeout`
    fn brpop(&mut self, keys: &[impl ToArg], timeout: u64) -> Self::Output<List> {
        let request = Request::command("BRPOP").args(keys.iter()).arg(timeout);
        self.dispatch::<List>(request)
    }

    /// `SORT key [BY pattern] [LIMIT offset count] [GET pattern ...] ASC|DESC [ALPHA]`
    fn sort(&mut self, key: impl ToArg, options: &SortOptions) -> Self::Output<List> {
        let request = options.apply(Request::command("SORT").arg(key));
        self.dispatch::<List>(request)
    }

    /// `SORT key ... STORE destination`; the reply is the stored element count
    fn sort_store(
        &mut self,
        key: impl ToArg,
        destination: impl ToArg,
        options: &SortOptions,
    ) -> Self::Output<i64> {
        let request = options
            .apply(Request::command("SORT").arg(key))
            .arg("STORE")
            .arg(destination);
        self.dispatch::<i64>(request)
    }

    /// `ZRANGEBYSCORE key min max LIMIT offset count`
    fn zrangebyscore_limit(
        &mut self,
        key: impl ToArg,
        min: impl ToArg,
        max: impl ToArg,
        offset: i64,
        count: i64,
    ) -> Self::Output<List> {
        let request = Request::command("ZRANGEBYSCORE")
            .arg(key)
            .arg(min)
            .arg(max)
            .arg("LIMIT")
            .arg(offset)
            .arg(count);
        self.dispatch::<List>(request)
    }

    /// `ZUNIONSTORE destination numkeys key [key ...] [WEIGHTS ...] [AGGREGATE ...]`
    fn zunionstore(
        &mut self,
        destination: impl ToArg,
        keys: &[impl ToArg],
        options: &StoreOptions,
    ) -> Self::Output<i64> {
        let request = Request::command("ZUNIONSTORE")
            .arg(destination)
            .arg(keys.len())
            .args(keys.iter());
        self.dispatch::<i64>(options.apply(request))
    }

    /// `ZINTERSTORE destination numkeys key [key ...] [WEIGHTS ...] [AGGREGATE ...]`
    fn zinterstore(
        &mut self,
        destination: impl ToArg,
        keys: &[impl ToArg],
        options: &StoreOptions,
    ) -> Self::Output<i64> {
        let request = Request::command("ZINTERSTORE")
            .arg(destination)
            .arg(keys.len())
            .args(keys.iter());
        self.dispatch::<i64>(options.apply(request))
    }
}

/// `LINSERT` pivot side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
}

impl ToArg for InsertPosition {
    fn to_arg(&self) -> bytes::Bytes {
        match self {
            InsertPosition::Before => bytes::Bytes::from_static(b"BEFORE"),
            InsertPosition::After => bytes::Bytes::from_static(b"AFTER"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl ToArg for SortOrder {
    fn to_arg(&self) -> bytes::Bytes {
        match self {
            SortOrder::Asc => bytes::Bytes::from_static(b"ASC"),
            SortOrder::Desc => bytes::Bytes::from_static(b"DESC"),
        }
    }
}

/// Score combination for `ZUNIONSTORE`/`ZINTERSTORE`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aggregate {
    #[default]
    Sum,
    Min,
    Max,
}

impl ToArg for Aggregate {
    fn to_arg(&self) -> bytes::Bytes {
        match self {
            Aggregate::Sum => bytes::Bytes::from_static(b"SUM"),
            Aggregate::Min => bytes::Bytes::from_static(b"MIN"),
            Aggregate::Max => bytes::Bytes::from_static(b"MAX"),
        }
    }
}

/// Options for `SORT`
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    by: Option<String>,
    limit: Option<(i64, i64)>,
    get: Vec<String>,
    order: SortOrder,
    alpha: bool,
}

impl SortOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by an external key pattern
    pub fn by(mut self, pattern: impl Into<String>) -> Self {
        self.by = Some(pattern.into());
        self
    }

    /// Return `count` elements starting at `offset`
    pub fn limit(mut self, offset: i64, count: i64) -> Self {
        self.limit = Some((offset, count));
        self
    }

    /// Fetch an external key per element; may be repeated
    pub fn get(mut self, pattern: impl Into<String>) -> Self {
        self.get.push(pattern.into());
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Compare lexicographically instead of numerically
    pub fn alpha(mut self) -> Self {
        self.alpha = true;
        self
    }

    fn apply(&self, mut request: Request) -> Request {
        if let Some(pattern) = &self.by {
            request = request.arg("BY").arg(pattern);
        }
        if let Some((offset, count)) = self.limit {
            request = request.arg("LIMIT").arg(offset).arg(count);
        }
        for pattern in &self.get {
            request = request.arg("GET").arg(pattern);
        }
        request = request.arg(self.order);
        if self.alpha {
            request = request.arg("ALPHA");
        }
        request
    }
}

/// Options for `ZUNIONSTORE`/`ZINTERSTORE`
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    weights: Vec<f64>,
    aggregate: Option<Aggregate>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// One multiplication factor per input key
    pub fn weights(mut self, weights: impl IntoIterator<Item = f64>) -> Self {
        self.weights = weights.into_iter().collect();
        self
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    fn apply(&self, mut request: Request) -> Request {
        if !self.weights.is_empty() {
            request = request.arg("WEIGHTS").args(self.weights.iter());
        }
        if let Some(aggregate) = self.aggregate {
            request = request.arg("AGGREGATE").arg(aggregate);
        }
        request
    }
}
