/*
    Merge test suite

    Modules:
    - convergence_tests: multi-device histories reconciled across batchings
*/
