mod inclusion_tests;
