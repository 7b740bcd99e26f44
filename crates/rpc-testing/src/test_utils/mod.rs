use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, Once,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing_subscriber::{filter, FmtSubscriber};

use crate::{
    models::{
        error::RunnerError,
        reference::{BlockReference, BlockTag},
        AccountState, BlockFixture, BlockchainFixture, Header, State,
    },
    normalizers::{parse_quantity, remove_leading_zeros, to_quantity},
    projection::{project_account_state, project_block, project_transaction},
    rpc::{
        methods::{
            LookupMethods, APPLY_BLOCK_FIXTURE, GET_BALANCE, GET_BLOCK, GET_BLOCK_TRANSACTION_COUNT,
            GET_CODE, GET_STORAGE_AT, GET_TRANSACTION_BY_BLOCK_AND_INDEX, GET_TRANSACTION_COUNT,
            GET_UNCLE_BY_BLOCK_AND_INDEX, GET_UNCLE_COUNT, RESET_TO_GENESIS_FIXTURE,
        },
        request::{RpcRequest, REQUEST_ID},
        Transport,
    },
};

static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        // Set-up tracing filter
        let filter = filter::EnvFilter::new("rpc_testing=info,build_utils=info");
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .without_time()
            .finish();
        // Another subscriber may already be installed by the test binary.
        let _ = tracing::subscriber::set_global_default(subscriber);
    })
}

/// Successful JSON-RPC response carrying `result`.
pub fn success(result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": REQUEST_ID, "result": result})
}

/// Failed JSON-RPC response carrying `message`.
pub fn failure(message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": REQUEST_ID,
        "error": {"code": -32000, "message": message}
    })
}

type Handler = Box<dyn Fn(&RpcRequest) -> Value + Send + Sync>;

/// Transport answering every request with a handler, and recording the
/// requests in the order they were sent.
pub struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<RpcRequest>>,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&RpcRequest) -> Value + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<RpcRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Methods of the requests received so far.
    pub fn methods(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.method).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &RpcRequest) -> Result<String, RunnerError> {
        self.requests
            .lock()
            .map_err(|_| RunnerError::Transport("mock transport poisoned".to_string()))?
            .push(request.clone());
        Ok((self.handler)(request).to_string())
    }
}

/// A well-behaved node serving the chain described by a fixture: the
/// pre-state at genesis, the post-state once blocks were applied, and the
/// good blocks up to its head. A new node starts with every good block
/// applied.
#[derive(Debug)]
pub struct FixtureNode {
    fixture: BlockchainFixture,
    head: AtomicUsize,
}

impl FixtureNode {
    pub fn new(fixture: BlockchainFixture) -> Self {
        let head = fixture.blocks.iter().filter(|b| b.is_good_block()).count();
        Self {
            fixture,
            head: AtomicUsize::new(head),
        }
    }

    pub fn handle(&self, request: &RpcRequest) -> Value {
        match self.dispatch(request) {
            Ok(result) => success(result),
            Err(message) => failure(&message),
        }
    }

    fn dispatch(&self, request: &RpcRequest) -> Result<Value, String> {
        let params = &request.params;
        let method = request.method.as_str();
        match method {
            RESET_TO_GENESIS_FIXTURE => {
                self.head.store(0, Ordering::SeqCst);
                Ok(Value::Bool(true))
            }
            APPLY_BLOCK_FIXTURE => {
                let block: BlockFixture =
                    serde_json::from_value(param(params, 0)?.clone()).map_err(|e| e.to_string())?;
                if block.is_good_block() {
                    self.head.fetch_add(1, Ordering::SeqCst);
                    Ok(block.rlp)
                } else {
                    Err("block rejected".to_string())
                }
            }
            GET_BALANCE | GET_CODE | GET_TRANSACTION_COUNT => {
                let state = self.account(params, 1)?;
                let field = match method {
                    GET_BALANCE => "balance",
                    GET_CODE => "code",
                    _ => "nonce",
                };
                Ok(project_account_state(state)[field].clone())
            }
            GET_STORAGE_AT => {
                let state = self.account(params, 2)?;
                let position = remove_leading_zeros(str_param(params, 1)?);
                Ok(state
                    .storage()
                    .find(|(key, _)| remove_leading_zeros(key) == position)
                    .map(|(_, value)| Value::String(value.clone()))
                    .unwrap_or_else(|| Value::String("0x0".to_string())))
            }
            _ => self.dispatch_lookup(method, params),
        }
    }

    fn dispatch_lookup(&self, method: &str, params: &[Value]) -> Result<Value, String> {
        if let Some(block) = self.lookup(&GET_BLOCK, method, params)? {
            return Ok(block.map_or(Value::Null, |b| self.rpc_block(b)));
        }
        if let Some(block) = self.lookup(&GET_BLOCK_TRANSACTION_COUNT, method, params)? {
            return Ok(block.map_or(Value::Null, |b| {
                Value::String(to_quantity(b.transactions().len()))
            }));
        }
        if let Some(block) = self.lookup(&GET_UNCLE_COUNT, method, params)? {
            return Ok(block.map_or(Value::Null, |b| {
                Value::String(to_quantity(b.uncle_headers().len()))
            }));
        }
        if let Some(block) = self.lookup(&GET_TRANSACTION_BY_BLOCK_AND_INDEX, method, params)? {
            let index = index_param(params)?;
            return Ok(block
                .and_then(|b| b.transactions().get(index))
                .map_or(Value::Null, |tx| {
                    let mut rpc_tx = project_transaction(tx);
                    rpc_tx.insert("hash".to_string(), json!(fake_hash(index)));
                    Value::Object(rpc_tx)
                }));
        }
        if let Some(block) = self.lookup(&GET_UNCLE_BY_BLOCK_AND_INDEX, method, params)? {
            let index = index_param(params)?;
            return Ok(block
                .and_then(|b| b.uncle_headers().get(index))
                .map_or(Value::Null, |uncle| rpc_header(uncle, 0, Vec::new())));
        }
        Err(format!("the method {method} does not exist/is not available"))
    }

    /// `None` if `method` is not part of `methods`, otherwise the block the
    /// reference points to, if any. Using the by-hash member with a number
    /// (or the opposite) is rejected.
    #[allow(clippy::type_complexity)]
    fn lookup(
        &self,
        methods: &LookupMethods,
        method: &str,
        params: &[Value],
    ) -> Result<Option<Option<&BlockFixture>>, String> {
        if method != methods.by_hash && method != methods.by_number {
            return Ok(None);
        }
        let reference = BlockReference::classify(param(params, 0)?).map_err(|e| e.to_string())?;
        if methods.resolve(&reference) != method {
            return Err(format!("invalid params: {method} called with {reference}"));
        }
        Ok(Some(self.block_at(&reference)))
    }

    /// Good blocks applied so far.
    fn good_blocks(&self) -> impl Iterator<Item = &BlockFixture> {
        let head = self.head.load(Ordering::SeqCst);
        self.fixture
            .blocks
            .iter()
            .filter(|b| b.is_good_block())
            .take(head)
    }

    fn block_at(&self, reference: &BlockReference) -> Option<&BlockFixture> {
        match reference {
            BlockReference::Hash(hash) => self
                .good_blocks()
                .find(|b| b.header_hash().map(str::to_lowercase) == Some(hash.to_lowercase())),
            BlockReference::Number(number) => self.good_blocks().find(|b| {
                b.block_header
                    .as_ref()
                    .and_then(|h| h.get("number"))
                    .and_then(Value::as_str)
                    .and_then(parse_quantity)
                    == Some(*number)
            }),
            BlockReference::Tag(BlockTag::Earliest) => None,
            BlockReference::Tag(_) => self.good_blocks().last(),
        }
    }

    fn state_at(&self, reference: &BlockReference) -> &State {
        match reference {
            BlockReference::Tag(BlockTag::Earliest) | BlockReference::Number(0) => &self.fixture.pre,
            _ if self.head.load(Ordering::SeqCst) == 0 => &self.fixture.pre,
            _ => &self.fixture.post_state,
        }
    }

    fn account(
        &self,
        params: &[Value],
        reference_index: usize,
    ) -> Result<&AccountState, String> {
        let addr = str_param(params, 0)?;
        let reference =
            BlockReference::classify(param(params, reference_index)?).map_err(|e| e.to_string())?;
        self.state_at(&reference)
            .get(addr)
            .ok_or_else(|| format!("unknown account {addr}"))
    }

    fn rpc_block(&self, block: &BlockFixture) -> Value {
        let header = block.block_header.as_ref().cloned().unwrap_or_default();
        let transactions = (0..block.transactions().len())
            .map(|i| json!(fake_hash(i)))
            .collect();
        rpc_header(&header, block.uncle_headers().len(), transactions)
    }
}

fn rpc_header(header: &Header, uncles: usize, transactions: Vec<Value>) -> Value {
    let mut rpc_block = project_block(header);
    rpc_block.insert("size".to_string(), json!("0x21f"));
    rpc_block.insert("totalDifficulty".to_string(), json!("0x40000"));
    rpc_block.insert("transactions".to_string(), Value::Array(transactions));
    rpc_block.insert(
        "uncles".to_string(),
        Value::Array((0..uncles).map(|i| json!(fake_hash(i + 100))).collect()),
    );
    Value::Object(rpc_block)
}

fn fake_hash(seed: usize) -> String {
    format!("0x{seed:064x}")
}

fn param(params: &[Value], index: usize) -> Result<&Value, String> {
    params
        .get(index)
        .ok_or_else(|| format!("missing param #{index}"))
}

fn str_param(params: &[Value], index: usize) -> Result<&str, String> {
    param(params, index)?
        .as_str()
        .ok_or_else(|| format!("param #{index} is not a string"))
}

fn index_param(params: &[Value]) -> Result<usize, String> {
    str_param(params, 1)
        .ok()
        .and_then(parse_quantity)
        .and_then(|index| usize::try_from(index).ok())
        .ok_or_else(|| "invalid index".to_string())
}
