use alloy_sol_types::sol;

sol! {
    /// Emitted by the L2 message queue when a message is appended to the withdraw trie.
    event AppendMessage(uint256 index, bytes32 messageHash);

    /// Emitted by the L2 scroll messenger when a message is sent to L1.
    event SentMessage(
        address indexed sender,
        address indexed target,
        uint256 value,
        uint256 messageNonce,
        uint256 gasLimit,
        bytes message
    );
}
