// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Drives a batch of transactions through the conflict-graph scheduler and
//! a worker pool, the way a block executor does: transactions touching the
//! same contract are chained in the graph, everything else runs in
//! parallel, and every executive runs on whichever worker popped it.

use basalt_dag::{ConflictGraph, INVALID_ID};
use basalt_executor::{
    block_context::BlockContext,
    precompiled::PrecompiledRegistry,
    storage::{
        contract_table_name, Entry, MemoryStorage, Storage, ACCOUNT_CODE,
        STORAGE_VALUE,
    },
    vm::{VmFactory, VmKind},
    ExecutiveFactory,
};
use basalt_vm_types::{
    vm_status, CallKind, CallMessage, HostInterface, Interpreter,
    InterpreterMessage, Keccak256, Revision, TransactionStatus, VmExecResult,
};
use parking_lot::Mutex;
use std::{sync::Arc, thread};

const BASE_COST: i64 = 10;

/// Appends its input under a per-transaction key and bumps a shared
/// counter row, so lost updates would be visible if conflicting
/// transactions ever ran concurrently.
struct CounterVm;

impl Interpreter for CounterVm {
    fn execute(
        &mut self, host: &mut dyn HostInterface, _revision: Revision,
        message: &InterpreterMessage, _code: &[u8],
    ) -> VmExecResult {
        if message.gas < BASE_COST {
            return VmExecResult::failure(vm_status::OUT_OF_GAS, 0);
        }
        let current = host.storage_load(b"counter").unwrap();
        let count = current[0];
        host.storage_store(b"counter", &[count + 1]).unwrap();
        host.storage_store(&message.input, b"seen").unwrap();
        VmExecResult::success(message.gas - BASE_COST, vec![count + 1])
    }
}

fn contract_address(index: usize) -> String {
    format!("{:040x}", 0xc0de00 + index)
}

#[test]
fn conflicting_transactions_serialize_through_the_graph() {
    const CONTRACTS: usize = 4;
    const PER_CONTRACT: u32 = 8;
    const WORKERS: usize = 4;
    let total = CONTRACTS as u32 * PER_CONTRACT;

    let storage = Arc::new(MemoryStorage::new());
    for index in 0..CONTRACTS {
        let table = contract_table_name(&contract_address(index), false);
        storage.create_table(&table, STORAGE_VALUE).unwrap();
        storage
            .set_row(&table, ACCOUNT_CODE, Entry::new(b"count".to_vec()))
            .unwrap();
        storage
            .set_row(&table, b"counter", Entry::new(vec![0]))
            .unwrap();
    }

    let mut context = BlockContext::new(storage.clone(), Arc::new(Keccak256));
    context.number = 42;
    let block_context = Arc::new(context);

    let mut vm_factory = VmFactory::new();
    vm_factory.register(VmKind::Evm, || Box::new(CounterVm));
    let factory = ExecutiveFactory::new(
        &block_context,
        Arc::new(PrecompiledRegistry::new()),
        Arc::new(vm_factory),
    );

    // transaction i targets contract i % CONTRACTS; same-contract
    // transactions are write conflicts and get chained in the graph
    let mut graph = ConflictGraph::new();
    graph.init(total);
    for id in CONTRACTS as u32..total {
        graph.add_edge(id - CONTRACTS as u32, id);
    }
    graph.seal();
    let graph = Arc::new(graph);

    let receipts: Arc<Mutex<Vec<Option<CallMessage>>>> =
        Arc::new(Mutex::new(vec![None; total as usize]));

    let mut workers = Vec::new();
    for _ in 0..WORKERS {
        let graph = graph.clone();
        let factory = factory.clone();
        let receipts = receipts.clone();
        workers.push(thread::spawn(move || {
            let mut id = graph.pop(true);
            while id != INVALID_ID {
                let address = contract_address(id as usize % CONTRACTS);
                let mut input = CallMessage::new(CallKind::Message);
                input.context_id = id as i64;
                input.origin = format!("sender-{}", id);
                input.sender = input.origin.clone();
                input.receiver = address.clone();
                input.code_address = address.clone();
                input.gas = 1_000_000;
                input.data = format!("tx-{}", id).into_bytes();

                let mut state = factory.build(&address, id as i64, 0);
                let output = state.start(input).unwrap();
                receipts.lock()[id as usize] = Some(output);

                let next = graph.consume(id);
                id = if next != INVALID_ID { next } else { graph.pop(true) };
            }
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }
    assert!(graph.has_finished());

    let receipts = receipts.lock();
    for receipt in receipts.iter() {
        let receipt = receipt.as_ref().expect("every transaction ran");
        assert_eq!(receipt.kind, CallKind::Finished);
        assert_eq!(receipt.status, TransactionStatus::None);
    }

    // each contract saw exactly PER_CONTRACT increments, none lost
    for index in 0..CONTRACTS {
        let table = contract_table_name(&contract_address(index), false);
        let counter = storage.get_row(&table, b"counter").unwrap();
        assert_eq!(counter.value, vec![PER_CONTRACT as u8]);
        for round in 0..PER_CONTRACT {
            let id = round as usize * CONTRACTS + index;
            let key = format!("tx-{}", id).into_bytes();
            assert_eq!(
                storage.get_row(&table, &key).unwrap().value,
                b"seen".to_vec()
            );
        }
    }

    // the receipts of one contract's chain report strictly increasing
    // counter values, the order the graph promised
    for index in 0..CONTRACTS {
        let values: Vec<u8> = (0..PER_CONTRACT)
            .map(|round| {
                let id = round as usize * CONTRACTS + index;
                receipts[id].as_ref().unwrap().data[0]
            })
            .collect();
        let expected: Vec<u8> = (1..=PER_CONTRACT as u8).collect();
        assert_eq!(values, expected);
    }
}
